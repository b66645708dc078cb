use std::sync::Arc;

use axum::Router;
use http_body_util::BodyExt; // for .collect
use hyper::{header, Request, StatusCode};
use serde_json::{json, Value};
use tokio::time::{timeout, Duration};
use tower::ServiceExt; // for .oneshot

use twitter_marketing_mcp::clients::memory_lol::MemoryLolRemote;
use twitter_marketing_mcp::clients::twitter::TwitterRemote;
use twitter_marketing_mcp::infra::config::TwitterCredentials;
use twitter_marketing_mcp::infra::http_app::build_app;
use twitter_marketing_mcp::infra::mcp::{factory_with, Unconfigured};

static MCP_PROTOCOL_VERSION: &str = "2025-03-26";

fn creds() -> TwitterCredentials {
    TwitterCredentials {
        consumer_key: "ck".into(),
        consumer_secret: "cs".into(),
        access_token: "at".into(),
        access_token_secret: "ats".into(),
        bearer_token: None,
    }
}

fn app_against(upstream: &httpmock::MockServer) -> Router {
    let twitter = Arc::new(TwitterRemote::new(upstream.base_url(), &creds()).unwrap());
    let history = Arc::new(MemoryLolRemote::new(upstream.base_url()).unwrap());
    let search = Arc::new(Unconfigured::new("serper_api not configured; set it to enable web_scrape"));
    build_app(factory_with(twitter, history, search))
}

fn mcp_request(session_id: Option<&str>, body: &Value) -> Request<axum::body::Body> {
    let mut b = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::ACCEPT, "application/json, text/event-stream")
        .header(header::CONTENT_TYPE, "application/json")
        .header("MCP-Protocol-Version", MCP_PROTOCOL_VERSION);
    if let Some(id) = session_id {
        b = b.header("MCP-Session-Id", id);
    }
    b.body(axum::body::Body::from(body.to_string())).unwrap()
}

/// First JSON-RPC message carried in an SSE response body.
async fn rpc_result(app: &Router, session_id: &str, body: Value) -> Value {
    let res = timeout(
        Duration::from_secs(20),
        app.clone().oneshot(mcp_request(Some(session_id), &body)),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(res.status().is_success(), "status {}", res.status());
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let s = String::from_utf8_lossy(&bytes);
    s.lines()
        .find_map(|line| line.strip_prefix("data: ").map(|d| d.to_string()))
        .and_then(|d| serde_json::from_str::<Value>(&d).ok())
        .unwrap_or_else(|| panic!("no rpc response in: {s}"))
}

async fn open_session(app: &Router) -> (String, Value) {
    let init = json!({
        "jsonrpc":"2.0","id":1,"method":"initialize",
        "params":{ "protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"test","version":"0.1"} }
    });
    let init_res = app.clone().oneshot(mcp_request(None, &init)).await.unwrap();
    assert!(init_res.status().is_success());
    let session_id = init_res
        .headers()
        .get("MCP-Session-Id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    let bytes = init_res.into_body().collect().await.unwrap().to_bytes();
    let init_body = String::from_utf8_lossy(&bytes)
        .lines()
        .find_map(|line| line.strip_prefix("data: ").map(|d| d.to_string()))
        .and_then(|d| serde_json::from_str::<Value>(&d).ok())
        .expect("initialize response");

    let initialized = json!({"jsonrpc":"2.0","method":"notifications/initialized","params":{}});
    let res = app
        .clone()
        .oneshot(mcp_request(Some(&session_id), &initialized))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    (session_id, init_body)
}

#[tokio::test]
async fn initialize_lists_tools_and_prompts() {
    let upstream = httpmock::MockServer::start();
    let app = app_against(&upstream);
    let (session_id, init) = open_session(&app).await;

    assert_eq!(init["result"]["serverInfo"]["name"], "twitter-marketing-mcp");
    assert!(init["result"]["capabilities"]["prompts"].is_object());

    let list = rpc_result(
        &app,
        &session_id,
        json!({"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}}),
    )
    .await;
    let names: Vec<&str> = list["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    for expected in ["tweet", "query_username_changes", "get_user_tweets", "send_dm", "web_scrape"] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }

    let prompt = rpc_result(
        &app,
        &session_id,
        json!({"jsonrpc":"2.0","id":3,"method":"prompts/get",
               "params":{"name":"username_change_prompt","arguments":{"screen_name":"jack"}}}),
    )
    .await;
    assert_eq!(
        prompt["result"]["messages"][0]["content"]["text"],
        "Please show the username change history for Twitter user @jack"
    );
}

#[tokio::test]
async fn username_history_round_trip_through_mcp() {
    let upstream = httpmock::MockServer::start();
    let m = upstream.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/v1/tw/jack");
        then.status(200).json_body(json!({
            "accounts": [{
                "id_str": "12",
                "screen_names": {"jack": ["2006-03-21", "2024-01-01"], "jackd": null}
            }]
        }));
    });

    let app = app_against(&upstream);
    let (session_id, _) = open_session(&app).await;

    let call = rpc_result(
        &app,
        &session_id,
        json!({"jsonrpc":"2.0","id":4,"method":"tools/call",
               "params":{"name":"query_username_changes","arguments":{"screen_name":"@jack"}}}),
    )
    .await;
    m.assert();
    assert_eq!(
        call["result"]["content"][0]["text"],
        "Username change history for jack:\n\nUser ID 12:\n- jack (2006-03-21 to 2024-01-01)\n- jackd"
    );
    assert_ne!(call["result"]["isError"], json!(true));
}

#[tokio::test]
async fn tweet_posts_and_upstream_errors_surface_as_tool_errors() {
    let upstream = httpmock::MockServer::start();
    let ok = upstream.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/2/tweets")
            .header_exists("authorization")
            .json_body(json!({"text": "hello world"}));
        then.status(201).json_body(json!({"data": {"id": "1790", "text": "hello world"}}));
    });
    upstream.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/2/dm_conversations/with/42/messages");
        then.status(403).json_body(json!({"title": "Forbidden", "detail": "You cannot send messages to this user."}));
    });

    let app = app_against(&upstream);
    let (session_id, _) = open_session(&app).await;

    let call = rpc_result(
        &app,
        &session_id,
        json!({"jsonrpc":"2.0","id":5,"method":"tools/call",
               "params":{"name":"tweet","arguments":{"text":"hello world"}}}),
    )
    .await;
    ok.assert();
    assert_eq!(call["result"]["content"][0]["text"], "✅ Tweet posted: 1790");

    let call = rpc_result(
        &app,
        &session_id,
        json!({"jsonrpc":"2.0","id":6,"method":"tools/call",
               "params":{"name":"send_dm","arguments":{"user_id":"42","message":"hi"}}}),
    )
    .await;
    assert_eq!(call["result"]["isError"], json!(true));
    assert_eq!(
        call["result"]["content"][0]["text"],
        "Failed to send DM: Twitter API error 403: You cannot send messages to this user."
    );

    let call = rpc_result(
        &app,
        &session_id,
        json!({"jsonrpc":"2.0","id":7,"method":"tools/call",
               "params":{"name":"web_scrape","arguments":{"query":"rust"}}}),
    )
    .await;
    assert_eq!(call["result"]["isError"], json!(true));
    assert!(call["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("❌ Web scraping error: serper_api not configured"));
}

#[tokio::test]
async fn missing_arguments_are_invalid_params() {
    let upstream = httpmock::MockServer::start();
    let app = app_against(&upstream);
    let (session_id, _) = open_session(&app).await;

    let call = rpc_result(
        &app,
        &session_id,
        json!({"jsonrpc":"2.0","id":8,"method":"tools/call",
               "params":{"name":"send_dm","arguments":{"user_id":"42"}}}),
    )
    .await;
    assert_eq!(call["error"]["code"], -32602);
}
