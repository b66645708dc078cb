use rmcp::model::{
    GetPromptResult, JsonObject, Prompt, PromptMessage, PromptMessageRole,
};
use rmcp::ErrorData as McpError;
use serde_json::json;

use super::format::strip_at;

pub const USERNAME_CHANGE_PROMPT: &str = "username_change_prompt";

pub fn list() -> Result<Vec<Prompt>, McpError> {
    let prompt: Prompt = serde_json::from_value(json!({
        "name": USERNAME_CHANGE_PROMPT,
        "description": "Ask for the username change history of a Twitter user",
        "arguments": [{
            "name": "screen_name",
            "description": "Twitter screen name, with or without the leading @",
            "required": true
        }]
    }))
    .map_err(|e| McpError::internal_error(format!("prompt definition: {e}"), None))?;
    Ok(vec![prompt])
}

pub fn render(name: &str, arguments: Option<&JsonObject>) -> Result<GetPromptResult, McpError> {
    if name != USERNAME_CHANGE_PROMPT {
        return Err(McpError::invalid_params(
            format!("unknown prompt: {name}"),
            None,
        ));
    }
    let screen_name = arguments
        .and_then(|a| a.get("screen_name"))
        .and_then(|v| v.as_str())
        .map(strip_at)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| McpError::invalid_params("missing required argument: screen_name", None))?;

    Ok(GetPromptResult {
        description: Some(format!("Username change history for @{screen_name}")),
        messages: vec![
            PromptMessage::new_text(
                PromptMessageRole::User,
                format!("Please show the username change history for Twitter user @{screen_name}"),
            ),
            PromptMessage::new_text(
                PromptMessageRole::Assistant,
                format!("I'll fetch the username change history for @{screen_name}."),
            ),
        ],
    })
}
