//! HTTP client for the medicine search backend

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefixes shorter than this (in characters) never reach the backend
pub const MIN_PREFIX_LEN: usize = 2;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single medicine record as returned by `/fetchMedicine`
///
/// The backend drops null columns from its documents, so every descriptive
/// field tolerates being absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub manufacturer_name: String,
    #[serde(default)]
    pub short_composition1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_composition2: Option<String>,
    #[serde(default)]
    pub pack_size_label: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub score: f64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub is_discontinued: bool,
}

impl Medicine {
    /// Second composition line, if it carries any text
    pub fn second_composition(&self) -> Option<&str> {
        self.short_composition2
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }
}

/// Response body of `/fetchMedicine`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MedicineResponse {
    #[serde(default)]
    pub medicines: Vec<Medicine>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub total: u64,
    /// Spelling alternatives, only sent when nothing matched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Response body of `/suggestions`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Any failure talking to the backend
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {detail}")]
    Status {
        url: String,
        status: u16,
        detail: String,
    },

    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl NetworkError {
    /// HTTP status code, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Connection settings for [`MedicineClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(crate::get_api_base_url(None))
    }
}

/// The two backend calls the search pipeline depends on
pub trait MedicineApi: Send + Sync {
    /// `GET /suggestions?prefix=..`, no length check
    fn fetch_suggestions(&self, prefix: &str) -> Result<Vec<String>, NetworkError>;

    /// `GET /fetchMedicine?name=..`
    fn fetch_medicine(&self, query: &str) -> Result<MedicineResponse, NetworkError>;
}

/// Autocomplete candidates for `prefix`, in backend order.
///
/// Prefixes shorter than [`MIN_PREFIX_LEN`] characters return an empty list
/// without touching the network.
pub fn get_suggestions(
    api: &dyn MedicineApi,
    prefix: &str,
) -> Result<Vec<String>, NetworkError> {
    if prefix.chars().count() < MIN_PREFIX_LEN {
        return Ok(Vec::new());
    }
    api.fetch_suggestions(prefix)
}

/// Run a full search. Exactly one backend call; the query is sent as given.
pub fn search_medicines(
    api: &dyn MedicineApi,
    query: &str,
) -> Result<MedicineResponse, NetworkError> {
    api.fetch_medicine(query)
}

pub fn suggestions_url(base_url: &str, prefix: &str) -> String {
    format!(
        "{}/suggestions?prefix={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(prefix)
    )
}

pub fn fetch_medicine_url(base_url: &str, query: &str) -> String {
    format!(
        "{}/fetchMedicine?name={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(query)
    )
}

/// Blocking reqwest implementation of [`MedicineApi`]
pub struct MedicineClient {
    http: Client,
    base_url: String,
}

impl MedicineClient {
    pub fn new(config: &ClientConfig) -> Result<Self, NetworkError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("medsearch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| NetworkError::Transport {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, NetworkError> {
        log::debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|source| NetworkError::Transport {
                url: url.to_string(),
                source,
            })?;

        let resp = check_response(url, resp)?;
        let body = resp.text().map_err(|source| NetworkError::Transport {
            url: url.to_string(),
            source,
        })?;

        decode_body(url, &body)
    }
}

impl MedicineApi for MedicineClient {
    fn fetch_suggestions(&self, prefix: &str) -> Result<Vec<String>, NetworkError> {
        let url = suggestions_url(&self.base_url, prefix);
        let resp: SuggestionsResponse = self.get_json(&url)?;
        Ok(resp.suggestions)
    }

    fn fetch_medicine(&self, query: &str) -> Result<MedicineResponse, NetworkError> {
        let url = fetch_medicine_url(&self.base_url, query);
        self.get_json(&url)
    }
}

fn check_response(url: &str, resp: Response) -> Result<Response, NetworkError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let detail = resp
        .text()
        .ok()
        .and_then(|body| error_detail(&body))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("no details").to_string());

    Err(NetworkError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        detail,
    })
}

/// Pull `error` / `message` out of a backend error body
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error").and_then(|v| v.as_str());
    let message = value.get("message").and_then(|v| v.as_str());
    match (error, message) {
        (Some(e), Some(m)) => Some(format!("{e}: {m}")),
        (Some(e), None) => Some(e.to_string()),
        (None, Some(m)) => Some(m.to_string()),
        (None, None) => None,
    }
}

fn decode_body<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, NetworkError> {
    serde_json::from_str(body).map_err(|source| NetworkError::Decode {
        url: url.to_string(),
        source,
    })
}
