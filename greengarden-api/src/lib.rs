//! Minimal client for the Green Garden High Story game server.
//!
//! This crate provides a focused client for the server's JSON API:
//! - `POST /api/start_game` to begin a new story
//! - `POST /api/chat` to talk to the character
//! - `POST /api/save` / `POST /api/load` for numbered save slots
//!
//! The server is the source of truth for the game state. The client only
//! carries it across the wire; interpretation (defaults, clamping, tiers)
//! lives in `greengarden-core`.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Server used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Environment variable consulted by [`GameClient::from_env`].
pub const SERVER_ENV_VAR: &str = "GREENGARDEN_SERVER";

/// Static path of the character portrait. The server ships a single asset.
pub const PORTRAIT_PATH: &str = "/static/images/SuTang.jpg";

/// Errors that can occur when talking to the game server.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Connection settings for [`GameClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Whole-request timeout. `None` waits for the server indefinitely.
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Game server client.
#[derive(Clone)]
pub struct GameClient {
    client: reqwest::Client,
    base_url: String,
}

impl GameClient {
    /// Create a client for the server at `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        Self::with_config(ClientConfig::new(base_url))
    }

    /// Create a client from explicit settings.
    pub fn with_config(config: ClientConfig) -> Result<Self, Error> {
        let base_url = normalize_base_url(&config.base_url)?;

        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Create a client from the `GREENGARDEN_SERVER` environment variable,
    /// falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Result<Self, Error> {
        let base_url =
            std::env::var(SERVER_ENV_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// The normalized server root, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of the character portrait.
    pub fn portrait_url(&self) -> String {
        format!("{}{PORTRAIT_PATH}", self.base_url)
    }

    /// Start a new game. The request carries no body.
    pub async fn start_game(&self) -> Result<StartGameResponse, Error> {
        self.post::<(), _>("/api/start_game", None).await
    }

    /// Send one line of player dialogue.
    pub async fn chat(&self, message: &str) -> Result<ChatResponse, Error> {
        self.post("/api/chat", Some(&ChatRequest { message })).await
    }

    /// Ask the server to save the current game into `slot`.
    pub async fn save(&self, slot: u32) -> Result<SaveResponse, Error> {
        self.post("/api/save", Some(&SlotRequest { slot })).await
    }

    /// Ask the server to restore the game stored in `slot`.
    pub async fn load(&self, slot: u32) -> Result<LoadResponse, Error> {
        self.post("/api/load", Some(&SlotRequest { slot })).await
    }

    async fn post<B, R>(&self, path: &str, body: Option<&B>) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "POST");

        let mut request = self.client.post(&url).headers(json_headers());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message_from_body(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "request failed".to_string());
            warn!(%url, status = status.as_u16(), %message, "server returned an error");
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

fn normalize_base_url(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("server URL is empty".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "server URL must start with http:// or https://, got {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}

/// Pull a readable reason out of an error body.
///
/// The server answers failures with `{"error": ..., "details": ...}`;
/// anything else is passed through as plain text.
fn error_message_from_body(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            error: Some(error),
            details,
        }) => Some(match details {
            Some(details) if !details.is_empty() => format!("{error}: {details}"),
            _ => error,
        }),
        _ => Some(body.to_string()),
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Game state as reported by the server.
///
/// Every field is optional; missing values are filled with defaults by the
/// consumer. `relationship_state` and `relationship` are two spellings of
/// the same label used by different server versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default, deserialize_with = "lenient_integer")]
    pub closeness: Option<i64>,
    #[serde(default)]
    pub relationship_state: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub scene: Option<String>,
}

impl GameState {
    pub fn with_closeness(mut self, closeness: i64) -> Self {
        self.closeness = Some(closeness);
        self
    }

    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship_state = Some(relationship.into());
        self
    }

    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }
}

/// Response to `POST /api/start_game`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartGameResponse {
    #[serde(default)]
    pub game_state: Option<GameState>,
    /// Opening narration. Older servers send it under `response`.
    #[serde(default, alias = "response")]
    pub intro_text: String,
}

/// Response to `POST /api/chat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub game_state: Option<GameState>,
}

/// Response to `POST /api/save`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
}

/// Response to `POST /api/load`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub game_state: Option<GameState>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct SlotRequest {
    slot: u32,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    details: Option<String>,
}

/// Accept integers, floats and numeric strings; anything else becomes `None`.
///
/// Strings are read like a leading-integer parse: `" 45 points"` is 45 and
/// `"45.9"` is 45.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => parse_leading_integer(&s),
        _ => None,
    }))
}

fn parse_leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
