use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::tool::{Parameters, ToolRouter};
use rmcp::model::{
    CallToolResult, Content, GetPromptRequestParam, GetPromptResult, Implementation, JsonObject,
    ListPromptsResult, PaginatedRequestParam, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer};

use super::{format, prompts};
use crate::domain::{HistoryLookup, TwitterApi, WebSearch};
use crate::core::error::HistoryError;
use crate::infra::runtime::limits::{Endpoint, RateWindow};
use crate::infra::runtime::mcp_transport::ServerHandler;

pub const MAX_TWEET_CHARS: usize = 280;
pub const DEFAULT_TWEET_COUNT: i64 = 10;
/// `max_results` bounds accepted by the user timeline endpoint.
pub const TWEET_COUNT_RANGE: (i64, i64) = (5, 100);

const TWEET_RATE_LIMITED: &str = "Rate limit exceeded for tweets. Please wait before posting again.";
const DM_RATE_LIMITED: &str = "Rate limit exceeded for DMs. Please wait before sending again.";

const INSTRUCTIONS: &str = "Twitter/X marketing tools: tweet posts a tweet, \
get_user_tweets reads a user's recent tweets, send_dm sends a direct message, \
query_username_changes lists past screen names via memory.lol and web_scrape \
runs a Google search through Serper.";

#[derive(Clone)]
pub struct TwitterSvc {
    pub twitter: Arc<dyn TwitterApi>,
    pub history: Arc<dyn HistoryLookup>,
    pub search: Arc<dyn WebSearch>,
    /// Shared across every session the factory builds.
    pub limits: RateWindow,
}

pub type TwitterRouter = ToolRouter<TwitterSvc>;

fn required_str<'a>(args: &'a JsonObject, field: &str) -> Result<&'a str, McpError> {
    args.get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| McpError::invalid_params(format!("missing required field: {field}"), None))
}

fn tweet_count(args: &JsonObject) -> Result<u32, McpError> {
    let (lo, hi) = TWEET_COUNT_RANGE;
    let raw = match args.get("count") {
        None | Some(serde_json::Value::Null) => DEFAULT_TWEET_COUNT,
        Some(v) => v
            .as_i64()
            .ok_or_else(|| McpError::invalid_params("count must be an integer", None))?,
    };
    // Clamped value fits comfortably in u32.
    Ok(raw.clamp(lo, hi) as u32)
}

fn ok_text(text: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text.into())]))
}

fn err_text(text: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(text.into())]))
}

#[rmcp::tool_router]
impl TwitterSvc {
    #[rmcp::tool(
        name = "tweet",
        description = "Post a tweet (max 280 characters). Input: {\"text\": string}"
    )]
    async fn tweet(&self, params: Parameters<JsonObject>) -> Result<CallToolResult, McpError> {
        let text = required_str(&params.0, "text")?;
        if text.chars().count() > MAX_TWEET_CHARS {
            return Err(McpError::invalid_params(
                format!("text exceeds {MAX_TWEET_CHARS} characters"),
                None,
            ));
        }

        let Some(slot) = self.limits.try_acquire(Endpoint::Tweet) else {
            tracing::warn!("local tweet quota exhausted");
            return err_text(TWEET_RATE_LIMITED);
        };

        match self.twitter.create_tweet(text).await {
            Ok(posted) => {
                tracing::info!(tweet_id = %posted.id, "tweet posted");
                ok_text(format!("✅ Tweet posted: {}", posted.id))
            }
            Err(e) => {
                self.limits.release(Endpoint::Tweet, slot);
                err_text(format!("❌ Twitter error: {e}"))
            }
        }
    }

    #[rmcp::tool(
        name = "query_username_changes",
        description = "Show the historical screen names of a Twitter account via memory.lol. Input: {\"screen_name\": string}"
    )]
    async fn query_username_changes(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let screen_name = format::strip_at(required_str(&params.0, "screen_name")?);
        if screen_name.is_empty() {
            return Err(McpError::invalid_params("missing required field: screen_name", None));
        }
        tracing::info!(screen_name, "Querying username changes");

        match self.history.history(screen_name).await {
            Ok(h) => ok_text(format::username_history(screen_name, &h)),
            Err(HistoryError::Status(code)) => err_text(format!(
                "Error: Failed to fetch data for {screen_name} (status {code})"
            )),
            Err(HistoryError::Network(detail)) => {
                tracing::warn!(screen_name, error = %detail, "memory.lol unreachable");
                err_text(format!(
                    "Error: Network issue while fetching data for {screen_name}"
                ))
            }
        }
    }

    #[rmcp::tool(
        name = "get_user_tweets",
        description = "Fetch recent tweets of a user. Input: {\"username\": string, \"count\"?: integer 5-100, default 10}"
    )]
    async fn get_user_tweets(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let username = format::strip_at(required_str(&params.0, "username")?);
        if username.is_empty() {
            return Err(McpError::invalid_params("missing required field: username", None));
        }
        let count = tweet_count(&params.0)?;

        let user = match self.twitter.user_by_username(username).await {
            Ok(Some(user)) => user,
            Ok(None) => return err_text(format!("❌ Could not find user: @{username}")),
            Err(e) => return err_text(format!("⚠️ Failed to get tweets for @{username}: {e}")),
        };

        match self.twitter.user_tweets(&user.id, count).await {
            Ok(list) => ok_text(format::tweets(&list)),
            Err(e) => err_text(format!("⚠️ Failed to get tweets for @{username}: {e}")),
        }
    }

    #[rmcp::tool(
        name = "send_dm",
        description = "Send a direct message to a user by numeric id. Input: {\"user_id\": string, \"message\": string}"
    )]
    async fn send_dm(&self, params: Parameters<JsonObject>) -> Result<CallToolResult, McpError> {
        let user_id = required_str(&params.0, "user_id")?.trim();
        let message = required_str(&params.0, "message")?;

        let Some(slot) = self.limits.try_acquire(Endpoint::Dm) else {
            tracing::warn!("local DM quota exhausted");
            return err_text(DM_RATE_LIMITED);
        };

        match self.twitter.send_dm(user_id, message).await {
            Ok(ev) => {
                tracing::info!(user_id, dm_event_id = %ev.dm_event_id, "dm sent");
                ok_text(format!("Successfully sent DM to user {user_id}"))
            }
            Err(e) => {
                self.limits.release(Endpoint::Dm, slot);
                err_text(format!("Failed to send DM: {e}"))
            }
        }
    }

    #[rmcp::tool(
        name = "web_scrape",
        description = "Google search through Serper; returns the raw JSON response. Input: {\"query\": string}"
    )]
    async fn web_scrape(&self, params: Parameters<JsonObject>) -> Result<CallToolResult, McpError> {
        let query = required_str(&params.0, "query")?;
        match self.search.search(query).await {
            Ok(body) => ok_text(body),
            Err(e) => err_text(format!("❌ Web scraping error: {e}")),
        }
    }
}

impl TwitterSvc {
    pub fn router() -> TwitterRouter {
        Self::tool_router()
    }
}

impl ServerHandler for TwitterSvc {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = env!("CARGO_PKG_NAME").to_string();
        server_info.version = env!("CARGO_PKG_VERSION").to_string();
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info,
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult::with_all_items(prompts::list()?))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        prompts::render(&request.name, request.arguments.as_ref())
    }
}
