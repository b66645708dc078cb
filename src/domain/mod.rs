use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::error::{HistoryError, SearchError, TwitterError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostedTweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TwitterUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DmEvent {
    pub dm_conversation_id: String,
    pub dm_event_id: String,
}

/// memory.lol answer for one screen name: every account that ever used it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct UsernameHistory {
    #[serde(default)]
    pub accounts: Vec<AccountHistory>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AccountHistory {
    pub id_str: String,
    #[serde(default, deserialize_with = "screen_names_in_order")]
    pub screen_names: Vec<ScreenName>,
}

/// A screen name plus the dates memory.lol observed it (first, last).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenName {
    pub name: String,
    pub dates: Vec<String>,
}

// Upstream sends `{"name": ["2019-01-01", "2021-03-04"] | null, ...}`; keep
// the object's key order rather than collecting into a sorted map.
fn screen_names_in_order<'de, D>(deserializer: D) -> Result<Vec<ScreenName>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScreenNamesVisitor;

    impl<'de> Visitor<'de> for ScreenNamesVisitor {
        type Value = Vec<ScreenName>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of screen name to observation dates")
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, dates)) = map.next_entry::<String, Option<Vec<String>>>()? {
                out.push(ScreenName {
                    name,
                    dates: dates.unwrap_or_default(),
                });
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(ScreenNamesVisitor)
}

/// The X API operations the tool surface needs. Implemented by the remote
/// client and by test doubles.
#[async_trait::async_trait]
pub trait TwitterApi: Send + Sync + 'static {
    async fn create_tweet(&self, text: &str) -> Result<PostedTweet, TwitterError>;
    /// `Ok(None)` when the handle does not resolve to a user.
    async fn user_by_username(&self, username: &str) -> Result<Option<TwitterUser>, TwitterError>;
    async fn user_tweets(&self, user_id: &str, max_results: u32) -> Result<Vec<Tweet>, TwitterError>;
    async fn send_dm(&self, user_id: &str, text: &str) -> Result<DmEvent, TwitterError>;
}

#[async_trait::async_trait]
pub trait HistoryLookup: Send + Sync + 'static {
    async fn history(&self, screen_name: &str) -> Result<UsernameHistory, HistoryError>;
}

#[async_trait::async_trait]
pub trait WebSearch: Send + Sync + 'static {
    /// Returns the raw upstream body.
    async fn search(&self, query: &str) -> Result<String, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn history_keeps_upstream_screen_name_order() {
        // Raw text: a `json!` value would already have its keys sorted.
        let raw = r#"{"accounts":[{"id_str":"1234","screen_names":{
            "zeta_first":["2019-01-01","2019-06-01"],
            "alpha_second":["2020-01-01"],
            "unknown_dates":null
        }}]}"#;
        let h: UsernameHistory = serde_json::from_str(raw).unwrap();

        let names: Vec<&str> = h.accounts[0]
            .screen_names
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, ["zeta_first", "alpha_second", "unknown_dates"]);
        assert_eq!(h.accounts[0].screen_names[1].dates, ["2020-01-01"]);
        assert!(h.accounts[0].screen_names[2].dates.is_empty());
    }

    #[test]
    fn history_tolerates_missing_or_null_fields() {
        let h: UsernameHistory = serde_json::from_value(json!({})).unwrap();
        assert!(h.accounts.is_empty());

        let h: UsernameHistory =
            serde_json::from_value(json!({"accounts":[{"id_str":"9","screen_names":null}]}))
                .unwrap();
        assert!(h.accounts[0].screen_names.is_empty());
    }

    #[test]
    fn tweet_parses_rfc3339_created_at() {
        let t: Tweet = serde_json::from_value(json!({
            "id": "1", "text": "gm", "created_at": "2024-05-01T12:30:00.000Z"
        }))
        .unwrap();
        assert_eq!(t.created_at.unwrap().to_string(), "2024-05-01 12:30:00 UTC");
    }
}
