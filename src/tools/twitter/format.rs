//! Plain-text renderings of upstream payloads for the assistant.

use chrono::SecondsFormat;

use crate::domain::{AccountHistory, ScreenName, Tweet, UsernameHistory};

/// Handles are accepted with or without the leading `@`.
pub fn strip_at(handle: &str) -> &str {
    let trimmed = handle.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed)
}

pub fn username_history(screen_name: &str, history: &UsernameHistory) -> String {
    if history.accounts.is_empty() {
        return format!("No username change history found for {screen_name}");
    }
    let blocks: Vec<String> = history.accounts.iter().map(account_block).collect();
    format!(
        "Username change history for {screen_name}:\n\n{}",
        blocks.join("\n\n")
    )
}

fn account_block(account: &AccountHistory) -> String {
    let mut out = format!("User ID {}:", account.id_str);
    for sn in &account.screen_names {
        out.push('\n');
        out.push_str(&screen_name_line(sn));
    }
    out
}

fn screen_name_line(sn: &ScreenName) -> String {
    match sn.dates.as_slice() {
        [] => format!("- {}", sn.name),
        [only] => format!("- {} ({only})", sn.name),
        [first, .., last] => format!("- {} ({first} to {last})", sn.name),
    }
}

pub fn tweets(tweets: &[Tweet]) -> String {
    if tweets.is_empty() {
        return "No tweets found.".to_string();
    }
    tweets
        .iter()
        .map(|t| {
            let when = t
                .created_at
                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_else(|| "unknown time".to_string());
            format!("- 🕒 {when}:\n  {}\n", t.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
