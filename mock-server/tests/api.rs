use axum::http::{self, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use mock_server::{app, AppState, CSRF_HEADER, MOCK_PASSWORD, MOCK_USER};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn basic_auth() -> String {
    format!("Basic {}", STANDARD.encode(format!("{MOCK_USER}:{MOCK_PASSWORD}")))
}

fn request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, basic_auth());
    if let Some(token) = token {
        builder = builder.header(CSRF_HEADER, token);
    }
    builder.body(body.to_string()).unwrap()
}

async fn token(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(request("GET", "/api/session/token", None, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await[CSRF_HEADER].as_str().unwrap().to_string()
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    let token = token(app).await;
    app.clone().oneshot(request("GET", uri, Some(&token), "")).await.unwrap()
}

// --- auth ---

#[tokio::test]
async fn token_requires_basic_auth() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/session/token").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = mock_server::app_with(AppState::new(MOCK_USER, "other-password"));
    let resp = app.oneshot(request("GET", "/api/session/token", None, "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_endpoint_returns_token_field() {
    let app = app();
    let token = token(&app).await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn versioned_routes_require_csrf() {
    let resp = app().oneshot(request("GET", "/api/v1.0/tool", None, "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app()
        .oneshot(request("GET", "/api/v1.0/tool", Some("made-up"), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn tokens_are_consumed_by_use() {
    let app = app();
    let tok = token(&app).await;
    let first = app
        .clone()
        .oneshot(request("GET", "/api/v1.0/tool", Some(&tok), ""))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let replay = app
        .clone()
        .oneshot(request("GET", "/api/v1.0/tool", Some(&tok), ""))
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::FORBIDDEN);

    let fresh = token(&app).await;
    let resp = app.oneshot(request("GET", "/api/v1.0/tool", Some(&fresh), "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_version_is_not_found() {
    let app = app();
    let token = token(&app).await;
    let resp = app.oneshot(request("GET", "/api/v9.9/tool", Some(&token), "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- envelopes ---

#[tokio::test]
async fn collections_are_hal_embedded() {
    let app = app();
    for rel in ["tool", "campaign", "service", "outreach"] {
        let resp = get(&app, &format!("/api/v1.0/{rel}")).await;
        assert_eq!(resp.status(), StatusCode::OK, "{rel}");
        let body = body_json(resp).await;
        assert!(body["_embedded"][format!("hal:{rel}")].is_array(), "{rel}: {body}");
    }
}

#[tokio::test]
async fn organizations_are_wrapped_in_data() {
    let app = app();
    let list = body_json(get(&app, "/api/v1.0/organization").await).await;
    assert_eq!(list["data"][0]["name"], "Green Neighbours");

    let one = body_json(get(&app, "/api/v1.0/organization/5").await).await;
    assert_eq!(one["data"]["id"], 5);
}

#[tokio::test]
async fn single_resources_are_raw() {
    let app = app();
    let tool = body_json(get(&app, "/api/v1.0/tool/1").await).await;
    assert_eq!(tool["title"], "Write your MP");

    let target = body_json(get(&app, "/api/v1.0/target/t-100").await).await;
    assert_eq!(target["full_name"], "Jane Member");

    let service = body_json(get(&app, "/api/v1.0/service/21").await).await;
    assert_eq!(service["name"], "Patch-through calling");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = app();
    for uri in [
        "/api/v1.0/tool/999",
        "/api/v1.0/campaign/999",
        "/api/v1.0/organization/999",
        "/api/v1.0/outreach/1",
        "/api/v1.0/lookup/999",
    ] {
        assert_eq!(get(&app, uri).await.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

// --- lookup ---

#[tokio::test]
async fn lookup_without_search_returns_custom_targets() {
    let app = app();
    let body = body_json(get(&app, "/api/v1.0/lookup/1").await).await;
    assert_eq!(body["search"], Value::Null);
    assert_eq!(body["targets"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn lookup_by_postal_code_filters_targets() {
    let app = app();
    let body = body_json(get(&app, "/api/v1.0/lookup/1/h2t%201s6").await).await;
    assert_eq!(body["search"], "h2t 1s6");
    assert_eq!(body["targets"], json!([{"id": "t-100", "full_name": "Jane Member", "postal_code": "H2T1S6"}]));
}

// --- actions ---

#[tokio::test]
async fn run_action_records_outreach() {
    let app = app();
    let token = token(&app).await;
    let resp = app
        .clone()
        .oneshot(request("PATCH", "/api/v1.0/action/2", Some(&token), r#"{"email":"ada@example.test"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let outreach = body_json(resp).await;
    assert_eq!(outreach["sid"], 1);
    assert_eq!(outreach["nid"], "2");
    assert_eq!(outreach["data"]["email"], "ada@example.test");

    let list = body_json(get(&app, "/api/v1.0/outreach?nid=2").await).await;
    assert_eq!(list["_embedded"]["hal:outreach"].as_array().unwrap().len(), 1);

    let other = body_json(get(&app, "/api/v1.0/outreach?nid=1").await).await;
    assert!(other["_embedded"]["hal:outreach"].as_array().unwrap().is_empty());

    let one = body_json(get(&app, "/api/v1.0/outreach/1").await).await;
    assert_eq!(one, outreach);
}

#[tokio::test]
async fn run_action_rejects_non_object_payload() {
    let app = app();
    let token = token(&app).await;
    let resp = app
        .oneshot(request("PATCH", "/api/v1.0/action/1", Some(&token), "[1,2]"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_action_describes_fields() {
    let app = app();
    let body = body_json(get(&app, "/api/v1.0/action/1").await).await;
    assert_eq!(body["nid"], 1);
    assert_eq!(body["fields"][2]["name"], "email");
}
