//! Wires upstream clients into the MCP handler.
//!
//! Missing credentials never stop the server: the affected tools get a
//! stand-in backend that answers every call with a configuration error, so
//! hosts still see the full tool list and an actionable message.

use std::sync::Arc;

use crate::clients::memory_lol::MemoryLolRemote;
use crate::clients::serper::SerperRemote;
use crate::clients::twitter::TwitterRemote;
use crate::core::error::{SearchError, TwitterError};
use crate::domain::{DmEvent, HistoryLookup, PostedTweet, Tweet, TwitterApi, TwitterUser, WebSearch};
use crate::infra::config::{serper_key_from_env, AppConfig, TwitterCredentials};
use crate::infra::runtime::limits::RateWindow;
use crate::tools::twitter::{TwitterRouter, TwitterSvc};

/// Backend for an upstream whose credentials are absent.
pub struct Unconfigured {
    reason: String,
}

impl Unconfigured {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait::async_trait]
impl TwitterApi for Unconfigured {
    async fn create_tweet(&self, _text: &str) -> Result<PostedTweet, TwitterError> {
        Err(TwitterError::NotConfigured(self.reason.clone()))
    }

    async fn user_by_username(&self, _username: &str) -> Result<Option<TwitterUser>, TwitterError> {
        Err(TwitterError::NotConfigured(self.reason.clone()))
    }

    async fn user_tweets(&self, _user_id: &str, _max_results: u32) -> Result<Vec<Tweet>, TwitterError> {
        Err(TwitterError::NotConfigured(self.reason.clone()))
    }

    async fn send_dm(&self, _user_id: &str, _text: &str) -> Result<DmEvent, TwitterError> {
        Err(TwitterError::NotConfigured(self.reason.clone()))
    }
}

#[async_trait::async_trait]
impl WebSearch for Unconfigured {
    async fn search(&self, _query: &str) -> Result<String, SearchError> {
        Err(SearchError::NotConfigured(self.reason.clone()))
    }
}

/// Factory required by the rmcp transports: one `(handler, router)` pair per
/// session, all sharing the same backends and quota window.
pub fn factory_with(
    twitter: Arc<dyn TwitterApi>,
    history: Arc<dyn HistoryLookup>,
    search: Arc<dyn WebSearch>,
) -> impl Fn() -> (TwitterSvc, TwitterRouter) + Clone + Send + Sync + 'static {
    let limits = RateWindow::default();
    move || {
        let handler = TwitterSvc {
            twitter: twitter.clone(),
            history: history.clone(),
            search: search.clone(),
            limits: limits.clone(),
        };
        (handler, TwitterSvc::router())
    }
}

pub fn factory_from_env(
) -> anyhow::Result<impl Fn() -> (TwitterSvc, TwitterRouter) + Clone + Send + Sync + 'static> {
    let cfg = AppConfig::from_env_and_toml();

    let twitter: Arc<dyn TwitterApi> = match TwitterCredentials::from_env() {
        Ok(creds) => Arc::new(TwitterRemote::from_config(&cfg.twitter, &creds)?),
        Err(e) => {
            tracing::warn!(error = %e, "Twitter credentials missing; tweet, get_user_tweets and send_dm disabled");
            Arc::new(Unconfigured::new(format!(
                "Twitter credentials not configured ({e})"
            )))
        }
    };

    let search: Arc<dyn WebSearch> = match serper_key_from_env() {
        Some(key) => Arc::new(SerperRemote::from_config(&cfg.serper, key)?),
        None => {
            tracing::warn!("serper_api not set; web_scrape disabled");
            Arc::new(Unconfigured::new(
                "serper_api not configured; set it to enable web_scrape",
            ))
        }
    };

    let history: Arc<dyn HistoryLookup> = Arc::new(MemoryLolRemote::from_config(&cfg.memory_lol)?);

    Ok(factory_with(twitter, history, search))
}
