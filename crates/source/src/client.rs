//! Blocking reqwest client (no Tokio runtime required).

use std::time::Duration;

use beantrack_engine::{rows_from_listing, EntityDataSource, EntityKind, FetchError, Row};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Dashboard API data source (blocking).
#[derive(Clone)]
pub struct HttpSource {
    http: reqwest::blocking::Client,
    api_base: String,
    token: Option<String>,
}

/// Error type for API requests.
#[derive(Debug)]
pub enum SourceError {
    /// HTTP client could not be constructed
    Client(String),
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// Response body was not a listing
    Parse(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Client(msg) => write!(f, "HTTP client error: {}", msg),
            SourceError::Network(msg) => write!(f, "Network error: {}", msg),
            SourceError::Http(code, msg) if msg.is_empty() => write!(f, "HTTP {}", code),
            SourceError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            SourceError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

impl HttpSource {
    /// Client for `api_base` (e.g. "https://dashboard.example.org/api").
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, SourceError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("beantrack/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.trim().is_empty() { None } else { Some(token) };
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn url_for(&self, kind: EntityKind) -> String {
        format!("{}/{}", self.api_base, kind.slug())
    }

    /// Fetch and parse one entity listing.
    pub fn list(&self, kind: EntityKind) -> Result<Vec<Row>, SourceError> {
        let url = self.url_for(kind);
        let response = self.get(&url)?;
        let body: serde_json::Value = response.json().map_err(|e| SourceError::Parse(e.to_string()))?;
        let rows = rows_from_listing(body).map_err(SourceError::Parse)?;
        log::debug!("GET {} -> {} rows", url, rows.len());
        Ok(rows)
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, SourceError> {
        let mut request = self.http.get(url).header("accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SourceError::Http(status, body.trim().to_string()));
        }

        Ok(response)
    }
}

impl EntityDataSource for HttpSource {
    fn fetch_all(&self, kind: EntityKind) -> Result<Vec<Row>, FetchError> {
        self.list(kind).map_err(|e| FetchError::new(kind, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_slug_without_double_slash() {
        let src = HttpSource::new("http://localhost:8000/api/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(src.url_for(EntityKind::CropSurveyStatus), "http://localhost:8000/api/crop-surveys");
    }

    #[test]
    fn test_blank_token_is_not_sent() {
        let src = HttpSource::new("http://localhost", DEFAULT_TIMEOUT).unwrap().with_token("  ");
        assert!(src.token.is_none());
    }

    #[test]
    fn test_http_error_display() {
        assert_eq!(SourceError::Http(503, String::new()).to_string(), "HTTP 503");
        assert_eq!(SourceError::Http(404, "no route".into()).to_string(), "HTTP 404: no route");
    }
}
