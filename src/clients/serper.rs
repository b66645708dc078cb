use reqwest::Client;
use serde::Serialize;
use std::time::Instant;

use crate::core::error::SearchError;
use crate::domain::WebSearch;
use crate::infra::config::{ToolConfig, DEFAULT_SERPER_BASE_URL};
use crate::infra::http::headers::add_standard_headers;
use crate::infra::runtime::limits::make_http_client;

#[derive(Clone)]
pub struct SerperRemote {
    base: String,
    http: Client,
    api_key: String,
}

#[derive(Serialize)]
struct SearchReq<'a> {
    q: &'a str,
}

impl SerperRemote {
    pub fn new(base: impl Into<String>, api_key: impl Into<String>) -> reqwest::Result<Self> {
        let base: String = base.into();
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http: make_http_client(&ToolConfig::default())?,
            api_key: api_key.into(),
        })
    }

    pub fn from_config(cfg: &ToolConfig, api_key: impl Into<String>) -> reqwest::Result<Self> {
        Ok(Self {
            base: cfg.base_url_or(DEFAULT_SERPER_BASE_URL),
            http: make_http_client(cfg)?,
            api_key: api_key.into(),
        })
    }

    /// Google search through Serper. The response body is passed through
    /// untouched.
    pub async fn search(&self, query: &str) -> Result<String, SearchError> {
        let url = format!("{}/search", self.base);
        let (builder, rid) = add_standard_headers(self.http.post(&url), None);
        tracing::debug!(endpoint = %url, request_id = %rid, "serper.search request");

        let start = Instant::now();
        let res = async {
            let resp = builder
                .header("X-API-KEY", &self.api_key)
                .json(&SearchReq { q: query })
                .send()
                .await
                .map_err(|e| SearchError::Network(e.to_string()))?;
            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| SearchError::Network(e.to_string()))?;
            if !status.is_success() {
                return Err(SearchError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(body)
        }
        .await;

        if res.is_err() {
            crate::infra::logging::log_metric("serper.search", "remote_error_total", 1.0);
        } else {
            let elapsed_ms = start.elapsed().as_millis() as f64;
            crate::infra::logging::log_metric("serper.search", "remote_latency_ms", elapsed_ms);
        }
        res
    }
}

#[async_trait::async_trait]
impl WebSearch for SerperRemote {
    async fn search(&self, query: &str) -> Result<String, SearchError> {
        SerperRemote::search(self, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn posts_query_with_api_key_and_returns_raw_body() {
        let server = MockServer::start();
        let raw = r#"{"organic":[{"title":"Rust","link":"https://www.rust-lang.org"}]}"#;
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .header("X-API-KEY", "sk-test")
                .json_body(json!({"q": "rust lang"}));
            then.status(200)
                .header("content-type", "application/json")
                .body(raw);
        });

        let cli = SerperRemote::new(server.base_url(), "sk-test").unwrap();
        let body = cli.search("rust lang").await.unwrap();
        m.assert();
        assert_eq!(body, raw);
    }

    #[tokio::test]
    async fn non_success_keeps_status_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/search");
            then.status(403).body("Unauthorized.");
        });

        let cli = SerperRemote::new(server.base_url(), "bad").unwrap();
        match cli.search("x").await.unwrap_err() {
            SearchError::Status { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "Unauthorized.");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
