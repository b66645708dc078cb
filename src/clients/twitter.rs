//! X (Twitter) API v2 client for the handful of endpoints the tools use.

use std::time::Instant;

use reqwest::{header::AUTHORIZATION, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::clients::oauth::OAuthSigner;
use crate::core::error::TwitterError;
use crate::domain::{DmEvent, PostedTweet, Tweet, TwitterApi, TwitterUser};
use crate::infra::config::{ToolConfig, TwitterCredentials, DEFAULT_TWITTER_BASE_URL};
use crate::infra::http::encoding::percent_encode;
use crate::infra::http::headers::add_standard_headers;
use crate::infra::runtime::limits::make_http_client;

#[derive(Clone, Copy)]
enum Auth {
    /// OAuth 1.0a on behalf of the configured account.
    User,
    /// Bearer token when configured, otherwise falls back to `User`.
    App,
}

#[derive(Clone)]
pub struct TwitterRemote {
    base: String,
    http: Client,
    signer: OAuthSigner,
    bearer: Option<String>,
}

impl TwitterRemote {
    pub fn new(base: impl Into<String>, creds: &TwitterCredentials) -> Result<Self, TwitterError> {
        let base: String = base.into();
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http: make_http_client(&ToolConfig::default())?,
            signer: OAuthSigner::new(creds),
            bearer: creds.bearer_token.clone(),
        })
    }

    pub fn from_config(cfg: &ToolConfig, creds: &TwitterCredentials) -> Result<Self, TwitterError> {
        Ok(Self {
            base: cfg.base_url_or(DEFAULT_TWITTER_BASE_URL),
            http: make_http_client(cfg)?,
            signer: OAuthSigner::new(creds),
            bearer: creds.bearer_token.clone(),
        })
    }

    pub async fn create_tweet(&self, text: &str) -> Result<PostedTweet, TwitterError> {
        let body = json!({ "text": text });
        let env: Envelope<PostedTweet> = self
            .send("twitter.create_tweet", Method::POST, "/2/tweets", &[], Some(&body), Auth::User)
            .await?;
        env.into_data()
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<TwitterUser>, TwitterError> {
        let path = format!("/2/users/by/username/{}", percent_encode(username));
        let env: Envelope<TwitterUser> = self
            .send("twitter.user_by_username", Method::GET, &path, &[], None::<&()>, Auth::App)
            .await?;
        if env.data.is_none() && !env.errors.is_empty() {
            tracing::debug!(username, errors = %env.error_summary(), "user lookup returned no data");
        }
        Ok(env.data)
    }

    pub async fn user_tweets(&self, user_id: &str, max_results: u32) -> Result<Vec<Tweet>, TwitterError> {
        let path = format!("/2/users/{}/tweets", percent_encode(user_id));
        let query = vec![
            ("max_results".to_string(), max_results.to_string()),
            ("tweet.fields".to_string(), "created_at,text".to_string()),
        ];
        let env: Envelope<Vec<Tweet>> = self
            .send("twitter.user_tweets", Method::GET, &path, &query, None::<&()>, Auth::App)
            .await?;
        Ok(env.data.unwrap_or_default())
    }

    pub async fn send_dm(&self, user_id: &str, text: &str) -> Result<DmEvent, TwitterError> {
        let path = format!("/2/dm_conversations/with/{}/messages", percent_encode(user_id));
        let body = json!({ "text": text });
        let env: Envelope<DmEvent> = self
            .send("twitter.send_dm", Method::POST, &path, &[], Some(&body), Auth::User)
            .await?;
        env.into_data()
    }

    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        op: &'static str,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
        auth: Auth,
    ) -> Result<T, TwitterError> {
        let url = format!("{}{}", self.base, path);
        let authorization = match (auth, &self.bearer) {
            (Auth::App, Some(bearer)) => format!("Bearer {bearer}"),
            _ => self.signer.sign(method.as_str(), &url, query)?,
        };

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(AUTHORIZATION, authorization);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(b) = body {
            builder = builder.json(b);
        }
        let (builder, rid) = add_standard_headers(builder, None);
        tracing::debug!(op, %method, endpoint = %url, request_id = %rid, "twitter request");

        let start = Instant::now();
        let res = match builder.send().await {
            Ok(resp) => handle_response(resp).await,
            Err(e) => Err(TwitterError::Http(e)),
        };
        match &res {
            Ok(_) => {
                let elapsed_ms = start.elapsed().as_millis() as f64;
                crate::infra::logging::log_metric(op, "remote_latency_ms", elapsed_ms);
            }
            Err(e) => {
                tracing::warn!(op, request_id = %rid, error = %e, "twitter request failed");
                crate::infra::logging::log_metric(op, "remote_error_total", 1.0);
            }
        }
        res
    }
}

async fn handle_response<T: DeserializeOwned>(resp: Response) -> Result<T, TwitterError> {
    let status = resp.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = resp
            .headers()
            .get("x-rate-limit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .map(|reset| (reset - chrono::Utc::now().timestamp()).max(0) as u64)
            .unwrap_or(60);
        return Err(TwitterError::RateLimited { retry_after });
    }

    let bytes = resp.bytes().await?;
    if status.is_success() {
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let message = serde_json::from_slice::<Problem>(&bytes)
        .ok()
        .and_then(|p| p.detail.or(p.title))
        .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
    Err(TwitterError::Api {
        status: status.as_u16(),
        message,
    })
}

/// RFC 7807 problem body X returns on failures.
#[derive(Deserialize)]
struct Problem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Standard v2 envelope: `data` on success, `errors` for partial failures.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ApiProblem>,
}

#[derive(Deserialize)]
struct ApiProblem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl<T> Envelope<T> {
    fn error_summary(&self) -> String {
        self.errors
            .iter()
            .filter_map(|e| e.detail.clone().or_else(|| e.title.clone()))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn into_data(self) -> Result<T, TwitterError> {
        let summary = self.error_summary();
        self.data.ok_or_else(|| TwitterError::Api {
            status: 200,
            message: if summary.is_empty() {
                "response carried no data".to_string()
            } else {
                summary
            },
        })
    }
}

#[async_trait::async_trait]
impl TwitterApi for TwitterRemote {
    async fn create_tweet(&self, text: &str) -> Result<PostedTweet, TwitterError> {
        TwitterRemote::create_tweet(self, text).await
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<TwitterUser>, TwitterError> {
        TwitterRemote::user_by_username(self, username).await
    }

    async fn user_tweets(&self, user_id: &str, max_results: u32) -> Result<Vec<Tweet>, TwitterError> {
        TwitterRemote::user_tweets(self, user_id, max_results).await
    }

    async fn send_dm(&self, user_id: &str, text: &str) -> Result<DmEvent, TwitterError> {
        TwitterRemote::send_dm(self, user_id, text).await
    }
}
