use reqwest::Client;
use std::time::Instant;

use crate::core::error::HistoryError;
use crate::domain::{HistoryLookup, UsernameHistory};
use crate::infra::config::{ToolConfig, DEFAULT_MEMORY_LOL_BASE_URL};
use crate::infra::http::encoding::percent_encode;
use crate::infra::http::headers::add_standard_headers;
use crate::infra::runtime::limits::make_http_client;

/// memory.lol username history service. Unauthenticated.
#[derive(Clone)]
pub struct MemoryLolRemote {
    base: String,
    http: Client,
}

impl MemoryLolRemote {
    pub fn new(base: impl Into<String>) -> reqwest::Result<Self> {
        let base: String = base.into();
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http: make_http_client(&ToolConfig::default())?,
        })
    }

    pub fn from_config(cfg: &ToolConfig) -> reqwest::Result<Self> {
        Ok(Self {
            base: cfg.base_url_or(DEFAULT_MEMORY_LOL_BASE_URL),
            http: make_http_client(cfg)?,
        })
    }

    pub async fn history(&self, screen_name: &str) -> Result<UsernameHistory, HistoryError> {
        let url = format!("{}/v1/tw/{}", self.base, percent_encode(screen_name));
        let (builder, rid) = add_standard_headers(self.http.get(&url), None);
        tracing::debug!(endpoint = %url, request_id = %rid, "memory_lol.history request");

        let start = Instant::now();
        let res = async {
            let resp = builder
                .send()
                .await
                .map_err(|e| HistoryError::Network(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(HistoryError::Status(resp.status().as_u16()));
            }
            // An unparseable 2xx body is treated like a transport failure.
            resp.json::<UsernameHistory>()
                .await
                .map_err(|e| HistoryError::Network(e.to_string()))
        }
        .await;

        if res.is_err() {
            crate::infra::logging::log_metric("memory_lol.history", "remote_error_total", 1.0);
        } else {
            let elapsed_ms = start.elapsed().as_millis() as f64;
            crate::infra::logging::log_metric("memory_lol.history", "remote_latency_ms", elapsed_ms);
        }
        res
    }
}

#[async_trait::async_trait]
impl HistoryLookup for MemoryLolRemote {
    async fn history(&self, screen_name: &str) -> Result<UsernameHistory, HistoryError> {
        MemoryLolRemote::history(self, screen_name).await
    }
}
