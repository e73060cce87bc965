use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::config::Config;

/// Serves `app` on an ephemeral localhost port and returns its base URL.
pub async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("axum serve");
    });
    format!("http://{}", addr)
}

pub fn keys(values: &[Option<&str>]) -> Vec<(String, Option<String>)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("TEST_KEY_{}", i + 1), v.map(str::to_string)))
        .collect()
}

/// Request counters shared with the provider stubs.
#[derive(Debug, Clone, Default)]
pub struct Calls {
    pub videos: Arc<AtomicUsize>,
    pub web: Arc<AtomicUsize>,
    pub completions: Arc<AtomicUsize>,
    pub last_prompt: Arc<Mutex<String>>,
}

/// All three providers on one server: `/youtube`, `/serper`, `/together`.
/// Only the key `valid` is accepted.
pub async fn stub_providers(calls: Calls) -> String {
    async fn youtube(
        State(calls): State<Calls>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
        if params.get("key").map(String::as_str) != Some("valid") {
            return Err(axum::http::StatusCode::FORBIDDEN);
        }
        calls.videos.fetch_add(1, Ordering::SeqCst);
        let max: usize = params["maxResults"].parse().unwrap();
        let items: Vec<serde_json::Value> = (0..max)
            .map(|i| {
                serde_json::json!({
                    "id": { "videoId": format!("v{}", i) },
                    "snippet": {
                        "title": format!("{} video {}", params["q"], i),
                        "thumbnails": { "high": { "url": format!("https://img/{}.jpg", i) } }
                    }
                })
            })
            .collect();
        Ok(Json(serde_json::json!({ "items": items })))
    }

    async fn serper(
        State(calls): State<Calls>,
        headers: axum::http::HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
        if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("valid") {
            return Err(axum::http::StatusCode::FORBIDDEN);
        }
        calls.web.fetch_add(1, Ordering::SeqCst);
        let q = body["q"].as_str().unwrap_or_default();
        Ok(Json(serde_json::json!({
            "organic": [ { "snippet": format!("{} snippet", q) } ]
        })))
    }

    async fn together(
        State(calls): State<Calls>,
        Json(body): Json<serde_json::Value>,
    ) -> Json<serde_json::Value> {
        calls.completions.fetch_add(1, Ordering::SeqCst);
        *calls.last_prompt.lock().unwrap() = body["prompt"].as_str().unwrap_or_default().into();
        Json(serde_json::json!({
            "choices": [ {
                "text": "Gist:\nGravity is the pull between masses.\n\nKey Points:\n- Mass attracts mass\n- Keeps planets in orbit"
            } ]
        }))
    }

    let app = Router::new()
        .route("/youtube", get(youtube))
        .route("/serper", post(serper))
        .route("/together", post(together))
        .with_state(calls);
    spawn_stub(app).await
}

pub fn test_config(base: &str, log_dir: &Path) -> Config {
    Config {
        youtube_keys: keys(&[Some("exhausted"), None, Some("valid")]),
        serper_keys: keys(&[None, Some("revoked"), Some("valid")]),
        together_api_key: Some("valid".into()),
        youtube_api_url: format!("{}/youtube", base),
        serper_api_url: format!("{}/serper", base),
        together_api_url: format!("{}/together", base),
        model: "test-model".into(),
        max_tokens: 300,
        temperature: 0.3,
        top_p: 0.8,
        context_char_budget: 2500,
        key_cooldown_secs: 0,
        http_timeout_secs: 5,
        session_ttl_secs: 3600,
        log_dir: log_dir.to_string_lossy().into_owned(),
        bind_addr: "127.0.0.1:0".into(),
    }
}
