pub mod page;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Form, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::agent::query::{Grade, StudyQuery, Subject};
use crate::agent::Agent;
use crate::session::{Feedback, SessionStore, View};

const SESSION_COOKIE: &str = "studymate_session";

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub sessions: SessionStore,
}

#[derive(Debug, Deserialize)]
struct AskForm {
    question: String,
    #[serde(default)]
    subject: Subject,
    #[serde(default)]
    grade: Grade,
}

#[derive(Debug, Deserialize)]
struct ViewForm {
    view: View,
}

#[derive(Debug, Deserialize)]
struct FeedbackForm {
    feedback: Feedback,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ask", post(ask))
        .route("/videos/more", post(more_videos))
        .route("/view", post(set_view))
        .route("/feedback", post(feedback))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %listener.local_addr()?, "StudyMate listening");
    axum::serve(listener, router(state))
        .await
        .context("Server error")
}

fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

fn back_to_page(id: Uuid) -> Response {
    (
        [(header::SET_COOKIE, session_cookie(id))],
        Redirect::to("/"),
    )
        .into_response()
}

/// Re-runs the whole page for the session, as every interaction does.
async fn index(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let (id, session) = app.sessions.get_or_create(session_id(&headers));
    let mut session = session.lock().await;

    let answer = app.agent.answer(&mut session).await;
    let body = page::render(&session, answer.as_ref());

    ([(header::SET_COOKIE, session_cookie(id))], Html(body)).into_response()
}

async fn ask(
    State(app): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AskForm>,
) -> Response {
    let (id, session) = app.sessions.get_or_create(session_id(&headers));
    let question = form.question.trim();
    if !question.is_empty() {
        let mut session = session.lock().await;
        session.ask(StudyQuery::new(question, form.subject, form.grade));
        tracing::debug!(session = %id, sessions = app.sessions.count(), "question set");
    }
    back_to_page(id)
}

async fn more_videos(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let (id, session) = app.sessions.get_or_create(session_id(&headers));
    session.lock().await.more_videos();
    back_to_page(id)
}

async fn set_view(
    State(app): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ViewForm>,
) -> Response {
    let (id, session) = app.sessions.get_or_create(session_id(&headers));
    session.lock().await.view = form.view;
    back_to_page(id)
}

async fn feedback(
    State(app): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<FeedbackForm>,
) -> Response {
    let (id, session) = app.sessions.get_or_create(session_id(&headers));
    let mut session = session.lock().await;
    if let Err(e) = app.agent.record_feedback(&mut session, form.feedback) {
        tracing::error!(error = %e, "failed to record feedback");
        return (StatusCode::INTERNAL_SERVER_ERROR, "could not record feedback").into_response();
    }
    back_to_page(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_stub, stub_providers, test_config, Calls};
    use std::sync::atomic::Ordering;

    async fn start_app(provider_base: &str, log_dir: &std::path::Path) -> (String, reqwest::Client) {
        let config = test_config(provider_base, log_dir);
        let agent = Agent::new(&config).unwrap();
        let state = AppState {
            agent: Arc::new(agent),
            sessions: SessionStore::new(std::time::Duration::from_secs(config.session_ttl_secs)),
        };
        let base = spawn_stub(router(state)).await;
        let browser = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();
        (base, browser)
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; {}={}; other=1", SESSION_COOKIE, id)
                .parse()
                .unwrap(),
        );
        assert_eq!(session_id(&headers), Some(id));

        let mut bad = HeaderMap::new();
        bad.insert(header::COOKIE, "studymate_session=nope".parse().unwrap());
        assert_eq!(session_id(&bad), None);
    }

    #[tokio::test]
    async fn ask_then_toggle_view_reuses_explanation() {
        let calls = Calls::default();
        let providers = stub_providers(calls.clone()).await;
        let logs = tempfile::tempdir().unwrap();
        let (base, browser) = start_app(&providers, logs.path()).await;

        let page = browser
            .post(format!("{}/ask", base))
            .form(&[("question", "What is gravity?"), ("subject", "general"), ("grade", "any")])
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert_eq!(page.matches("class=\"video\"").count(), 3);
        assert!(page.contains("<p class=\"gist\">Gravity is the pull between masses.</p>"));

        let page = browser
            .post(format!("{}/view", base))
            .form(&[("view", "key_points")])
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert!(page.contains("<li>Mass attracts mass</li><li>Keeps planets in orbit</li>"));
        assert_eq!(calls.completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn more_videos_grows_by_three() {
        let calls = Calls::default();
        let providers = stub_providers(calls.clone()).await;
        let logs = tempfile::tempdir().unwrap();
        let (base, browser) = start_app(&providers, logs.path()).await;

        browser
            .post(format!("{}/ask", base))
            .form(&[("question", "What is DNA?")])
            .send()
            .await
            .unwrap();
        let page = browser
            .post(format!("{}/videos/more", base))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert_eq!(page.matches("class=\"video\"").count(), 6);
        assert_eq!(calls.completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sessions_do_not_share_history() {
        let calls = Calls::default();
        let providers = stub_providers(calls.clone()).await;
        let logs = tempfile::tempdir().unwrap();
        let (base, alice) = start_app(&providers, logs.path()).await;
        let bob = reqwest::Client::builder().cookie_store(true).build().unwrap();

        alice
            .post(format!("{}/ask", base))
            .form(&[("question", "What is an atom?")])
            .send()
            .await
            .unwrap();
        let page = bob.get(format!("{}/", base)).send().await.unwrap().text().await.unwrap();

        assert!(!page.contains("What is an atom?"));
        assert!(!page.contains("Recent questions"));
    }

    #[tokio::test]
    async fn feedback_is_acknowledged() {
        let providers = stub_providers(Calls::default()).await;
        let logs = tempfile::tempdir().unwrap();
        let (base, browser) = start_app(&providers, logs.path()).await;

        browser
            .post(format!("{}/ask", base))
            .form(&[("question", "What is gravity?")])
            .send()
            .await
            .unwrap();
        let page = browser
            .post(format!("{}/feedback", base))
            .form(&[("feedback", "helpful")])
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert!(page.contains("Thanks for your feedback!"));
        assert!(logs.path().join("feedback.jsonl").exists());
    }

    #[tokio::test]
    async fn blank_question_renders_empty_page() {
        let calls = Calls::default();
        let providers = stub_providers(calls.clone()).await;
        let logs = tempfile::tempdir().unwrap();
        let (base, browser) = start_app(&providers, logs.path()).await;

        let response = browser
            .post(format!("{}/ask", base))
            .form(&[("question", "   ")])
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert!(!response.text().await.unwrap().contains("You asked"));
        assert_eq!(calls.videos.load(Ordering::SeqCst), 0);

        let health = browser.get(format!("{}/health", base)).send().await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");
    }
}
