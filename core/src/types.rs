//! Small value types shared by the request layer and the client.
//!
//! Resource payloads themselves are kept as `serde_json::Value`; the client
//! never looks past the envelope.

use std::fmt;

use indexmap::IndexMap;

/// Query parameters, sent in insertion order. Inserting an existing key
/// replaces its value without moving it.
pub type Params = IndexMap<String, String>;

/// Collect key/value pairs into `Params`.
pub fn params<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// Search criteria for looking up a tool's targets.
///
/// Rendered verbatim into the last path segment of `lookup/{tool_id}/...`.
/// Nothing is validated here; the API decides what a search matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LookupSearch {
    /// No search segment. Returns the custom targets attached to the tool.
    #[default]
    Custom,
    PostalCode(String),
    /// Rendered as `lat::long`.
    Coordinates { lat: f64, long: f64 },
    /// Address components rendered joined by `::`.
    Address(Vec<String>),
    /// Free text, for CSV-backed tools.
    Term(String),
}

impl LookupSearch {
    /// Path segment to append, or `None` when the search is empty.
    pub fn segment(&self) -> Option<String> {
        let segment = match self {
            LookupSearch::Custom => return None,
            LookupSearch::PostalCode(code) => code.clone(),
            LookupSearch::Coordinates { lat, long } => format!("{lat}::{long}"),
            LookupSearch::Address(parts) => parts.join("::"),
            LookupSearch::Term(term) => term.clone(),
        };
        if segment.is_empty() {
            None
        } else {
            Some(segment)
        }
    }
}

impl From<&str> for LookupSearch {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            LookupSearch::Custom
        } else {
            LookupSearch::Term(s.to_string())
        }
    }
}

impl From<Option<&str>> for LookupSearch {
    fn from(s: Option<&str>) -> Self {
        s.map_or(LookupSearch::Custom, LookupSearch::from)
    }
}

impl fmt::Display for LookupSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment().as_deref().unwrap_or(""))
    }
}
