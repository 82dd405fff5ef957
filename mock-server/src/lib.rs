use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const MOCK_USER: &str = "mock-user";
pub const MOCK_PASSWORD: &str = "mock-password";
pub const API_VERSION: &str = "v1.0";
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Seeded resources plus everything recorded by running actions.
pub struct Store {
    pub tools: BTreeMap<String, Value>,
    pub targets: BTreeMap<String, Value>,
    pub campaigns: BTreeMap<String, Value>,
    pub organizations: BTreeMap<String, Value>,
    pub services: BTreeMap<String, Value>,
    pub outreaches: Vec<Value>,
}

impl Store {
    pub fn seeded() -> Self {
        let keyed = |items: Vec<Value>, key: &str| -> BTreeMap<String, Value> {
            items.into_iter().map(|item| (id_of(&item, key), item)).collect()
        };

        let tools = keyed(
            vec![
                json!({"nid": 1, "title": "Write your MP", "type": "email", "campaign": 10}),
                json!({"nid": 2, "title": "Call city hall", "type": "call", "campaign": 10}),
            ],
            "nid",
        );
        let targets = keyed(
            vec![
                json!({"id": "t-100", "full_name": "Jane Member", "postal_code": "H2T1S6"}),
                json!({"id": "t-200", "full_name": "Sam Councillor", "postal_code": "K1A0A6"}),
            ],
            "id",
        );
        let campaigns = keyed(vec![json!({"nid": 10, "title": "Clean air now"})], "nid");
        let organizations = keyed(vec![json!({"id": 5, "name": "Green Neighbours"})], "id");
        let services = keyed(
            vec![
                json!({"id": 20, "name": "Email delivery"}),
                json!({"id": 21, "name": "Patch-through calling"}),
            ],
            "id",
        );

        Self {
            tools,
            targets,
            campaigns,
            organizations,
            services,
            outreaches: Vec::new(),
        }
    }
}

fn id_of(item: &Value, key: &str) -> String {
    match &item[key] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Clone)]
pub struct AppState {
    authorization: Arc<String>,
    tokens: Arc<RwLock<HashSet<String>>>,
    store: Arc<RwLock<Store>>,
}

impl AppState {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            authorization: Arc::new(format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))),
            tokens: Arc::new(RwLock::new(HashSet::new())),
            store: Arc::new(RwLock::new(Store::seeded())),
        }
    }
}

pub fn app() -> Router {
    app_with(AppState::new(MOCK_USER, MOCK_PASSWORD))
}

pub fn app_with(state: AppState) -> Router {
    let versioned = Router::new()
        .route("/tool", get(list_tools))
        .route("/tool/{id}", get(get_tool))
        .route("/lookup/{id}", get(lookup_custom))
        .route("/lookup/{id}/{search}", get(lookup_search))
        .route("/action/{id}", get(get_action).patch(run_action).put(run_action))
        .route("/target/{id}", get(get_target))
        .route("/campaign", get(list_campaigns))
        .route("/campaign/{id}", get(get_campaign))
        .route("/organization", get(list_organizations))
        .route("/organization/{id}", get(get_organization))
        .route("/service", get(list_services))
        .route("/service/{id}", get(get_service))
        .route("/outreach", get(list_outreaches))
        .route("/outreach/{id}", get(get_outreach))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_csrf));

    Router::new()
        .route("/api/session/token", get(issue_token))
        .nest(&format!("/api/{API_VERSION}"), versioned)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_basic_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- auth ---

async fn require_basic_auth(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    let given = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    if given != Some(state.authorization.as_str()) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

/// Tokens are single-use: a protected call consumes the token it presents.
async fn require_csrf(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    let token = req.headers().get(CSRF_HEADER).and_then(|v| v.to_str().ok());
    let known = match token {
        Some(token) => state.tokens.write().await.remove(token),
        None => false,
    };
    if !known {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(next.run(req).await)
}

async fn issue_token(State(state): State<AppState>) -> Json<Value> {
    let token = Uuid::new_v4().to_string();
    state.tokens.write().await.insert(token.clone());
    Json(json!({ CSRF_HEADER: token }))
}

// --- envelopes ---

fn embedded(rel: &str, items: Vec<Value>) -> Json<Value> {
    let total = items.len();
    let relation = format!("hal:{rel}");
    Json(json!({
        "_links": {"self": {"href": format!("/api/{API_VERSION}/{rel}")}},
        "_embedded": { relation: items },
        "total_items": total,
    }))
}

fn found(item: Option<&Value>) -> Result<Json<Value>, StatusCode> {
    item.cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

// --- tools, targets, actions ---

async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    embedded("tool", store.tools.values().cloned().collect())
}

async fn get_tool(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    found(state.store.read().await.tools.get(&id))
}

async fn lookup_custom(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    let store = state.store.read().await;
    if !store.tools.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "search": null,
        "targets": store.targets.values().cloned().collect::<Vec<_>>(),
    })))
}

async fn lookup_search(
    State(state): State<AppState>,
    Path((id, search)): Path<(String, String)>,
) -> Result<Json<Value>, StatusCode> {
    let store = state.store.read().await;
    if !store.tools.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let needle = search.replace(' ', "").to_uppercase();
    let targets: Vec<Value> = store
        .targets
        .values()
        .filter(|t| t["postal_code"].as_str() == Some(needle.as_str()))
        .cloned()
        .collect();
    Ok(Json(json!({ "search": search, "targets": targets })))
}

async fn get_action(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    let store = state.store.read().await;
    let tool = store.tools.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({
        "nid": tool["nid"],
        "title": tool["title"],
        "fields": [
            {"name": "first_name", "required": true},
            {"name": "last_name", "required": true},
            {"name": "email", "required": true},
            {"name": "postal_code", "required": false},
        ],
    })))
}

async fn run_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = state.store.write().await;
    if !store.tools.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    if !payload.is_object() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let outreach = json!({
        "sid": store.outreaches.len() + 1,
        "nid": id,
        "data": payload,
    });
    store.outreaches.push(outreach.clone());
    Ok(Json(outreach))
}

async fn get_target(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    found(state.store.read().await.targets.get(&id))
}

// --- campaigns, organizations, services ---

async fn list_campaigns(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    embedded("campaign", store.campaigns.values().cloned().collect())
}

async fn get_campaign(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    found(state.store.read().await.campaigns.get(&id))
}

async fn list_organizations(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    Json(json!({ "data": store.organizations.values().cloned().collect::<Vec<_>>() }))
}

async fn get_organization(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    let store = state.store.read().await;
    let organization = store.organizations.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({ "data": organization })))
}

async fn list_services(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    embedded("service", store.services.values().cloned().collect())
}

async fn get_service(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    found(state.store.read().await.services.get(&id))
}

// --- outreaches ---

async fn list_outreaches(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = state.store.read().await;
    let outreaches = store
        .outreaches
        .iter()
        .filter(|o| match query.get("nid") {
            Some(nid) => o["nid"].as_str() == Some(nid.as_str()),
            None => true,
        })
        .cloned()
        .collect();
    embedded("outreach", outreaches)
}

async fn get_outreach(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    let store = state.store.read().await;
    found(store.outreaches.iter().find(|o| id_of(o, "sid") == id))
}
