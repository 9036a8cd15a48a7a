//! HTTP surface: JSON endpoints over the session service
//!
//! Every response carries a boolean `success`; failures add a `message`
//! and the matching status code.

mod error;
mod extract;
mod handlers;

use anyhow::{anyhow, Result};
use axum::{
    extract::FromRef,
    routing::{get, post, put},
    Router,
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{
    config::{Config, MIN_SECRET_LEN},
    llm::{AnswerGenerator, OpenAIProvider},
    session::{Database, SessionService},
};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: SessionService,
    key: Key,
}

impl AppState {
    /// The cookie key is derived from `secret`, which must be at least 32 bytes.
    pub fn new(service: SessionService, secret: &str) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(anyhow!("Session secret must be at least {} bytes", MIN_SECRET_LEN));
        }

        Ok(Self {
            service,
            key: Key::derive_from(secret.as_bytes()),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/send_question", post(handlers::send_question))
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/sessions/:id/activate", post(handlers::activate_session))
        .route("/sessions/:id/rename", put(handlers::rename_session))
        .route("/current_session", get(handlers::current_session))
        .route("/follow_up_questions", post(handlers::follow_up_questions))
        .route("/improve_answer", post(handlers::improve_answer))
        .with_state(state)
}

/// Build everything from configuration and serve until interrupted.
pub async fn serve(config: &Config) -> Result<()> {
    config.validate_server()?;

    let db = Arc::new(Database::connect(&config.database_url).await?);
    let provider = Arc::new(OpenAIProvider::new(config.provider_config())?);
    let generator = AnswerGenerator::new(provider, config.temperature);
    let service = SessionService::new(db, generator);

    let secret = config
        .session_secret
        .as_deref()
        .ok_or_else(|| anyhow!("Session secret is required"))?;
    let app = router(AppState::new(service, secret)?);

    let addr = config.bind_address();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow!("Failed to bind {}: {}", addr, e))?;
    info!("Interview assistant listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to create SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down gracefully"),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}

#[cfg(test)]
mod tests {
    use super::extract::ACTIVE_SESSION_COOKIE;
    use super::*;
    use crate::llm::generator::tests::StubProvider;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    const SECRET: &str = "0123456789abcdef0123456789abcdef-test-secret";

    fn app_with(provider: StubProvider) -> Router {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let service = SessionService::new(db, AnswerGenerator::new(Arc::new(provider), 0.7));
        router(AppState::new(service, SECRET).unwrap())
    }

    fn app() -> Router {
        app_with(StubProvider::replying("I am a software engineer..."))
    }

    /// Minimal cookie-carrying client
    struct Client {
        app: Router,
        cookie: Option<String>,
    }

    impl Client {
        fn new(app: Router) -> Self {
            Self { app, cookie: None }
        }

        async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(cookie) = &self.cookie {
                request = request.header(header::COOKIE, cookie);
            }
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();

            let response = self.app.clone().oneshot(request).await.unwrap();
            self.remember_cookie(&response);

            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap())
        }

        fn remember_cookie(&mut self, response: &Response) {
            for value in response.headers().get_all(header::SET_COOKIE) {
                let pair = value.to_str().unwrap().split(';').next().unwrap().to_string();
                let (name, val) = pair.split_once('=').unwrap();
                if name != ACTIVE_SESSION_COOKIE {
                    continue;
                }
                self.cookie = if val.is_empty() { None } else { Some(pair.clone()) };
            }
        }
    }

    #[tokio::test]
    async fn test_demo_session_flow() {
        let mut client = Client::new(app());

        let (status, body) = client
            .send(Method::POST, "/sessions", Some(serde_json::json!({ "title": "Demo" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["session"]["title"], "Demo");
        let id = body["session"]["id"].as_i64().unwrap();
        assert!(client.cookie.is_some());

        let (status, body) = client
            .send(
                Method::POST,
                "/send_question",
                Some(serde_json::json!({ "question": "Tell me about yourself" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "I am a software engineer...");
        assert_eq!(body["session_id"], id);
        assert!(body["timestamp"].as_str().is_some());

        let (status, body) = client.send(Method::GET, &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["interaction_count"], 1);
        let interactions = body["interactions"].as_array().unwrap();
        assert_eq!(interactions.len(), 1);
        assert_eq!(interactions[0]["interaction_order"], 1);
        assert_eq!(interactions[0]["question"], "Tell me about yourself");
        assert_eq!(interactions[0]["answer"], "I am a software engineer...");
    }

    #[tokio::test]
    async fn test_delete_active_session_clears_current() {
        let mut client = Client::new(app());

        let (_, a) = client.send(Method::POST, "/sessions", Some(serde_json::json!({ "title": "A" }))).await;
        let (_, b) = client.send(Method::POST, "/sessions", Some(serde_json::json!({ "title": "B" }))).await;
        let a_id = a["session"]["id"].as_i64().unwrap();
        let b_id = b["session"]["id"].as_i64().unwrap();

        let (_, current) = client.send(Method::GET, "/current_session", None).await;
        assert_eq!(current["session"]["id"], b_id);

        let (_, a_detail) = client.send(Method::GET, &format!("/sessions/{}", a_id), None).await;
        assert_eq!(a_detail["session"]["is_active"], false);

        let (status, body) = client.send(Method::DELETE, &format!("/sessions/{}", b_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Session deleted successfully");
        assert!(client.cookie.is_none());

        let (status, current) = client.send(Method::GET, "/current_session", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(current["success"], true);
        assert!(current["session"].is_null());
    }

    #[tokio::test]
    async fn test_activate_and_list_order() {
        let mut client = Client::new(app());
        let mut ids = Vec::new();
        for title in ["One", "Two", "Three"] {
            let (_, body) = client.send(Method::POST, "/sessions", Some(serde_json::json!({ "title": title }))).await;
            ids.push(body["session"]["id"].as_i64().unwrap());
        }

        let (_, listed) = client.send(Method::GET, "/sessions", None).await;
        let listed: Vec<i64> = listed["sessions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_i64().unwrap())
            .collect();
        assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

        let (status, body) = client
            .send(Method::POST, &format!("/sessions/{}/activate", ids[0]), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["is_active"], true);

        let (_, current) = client.send(Method::GET, "/current_session", None).await;
        assert_eq!(current["session"]["id"], ids[0]);

        let (status, body) = client.send(Method::POST, "/sessions/9999/activate", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_answered_session_lists_first() {
        let app = app();
        let mut first = Client::new(app.clone());
        let mut second = Client::new(app);

        let (_, body) = first.send(Method::POST, "/sessions", Some(serde_json::json!({ "title": "A" }))).await;
        let a = body["session"]["id"].as_i64().unwrap();
        let (_, body) = second.send(Method::POST, "/sessions", Some(serde_json::json!({ "title": "B" }))).await;
        let b = body["session"]["id"].as_i64().unwrap();

        let (_, listed) = first.send(Method::GET, "/sessions", None).await;
        assert_eq!(listed["sessions"][0]["id"], b);

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let (status, _) = first
            .send(Method::POST, "/send_question", Some(serde_json::json!({ "question": "Why Rust?" })))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = second.send(Method::GET, "/sessions", None).await;
        assert_eq!(listed["sessions"][0]["id"], a);
        assert_eq!(listed["sessions"][0]["interaction_count"], 1);
        assert_eq!(listed["sessions"][1]["id"], b);
    }

    #[tokio::test]
    async fn test_validation_failures() {
        let mut client = Client::new(app());

        let (status, body) = client
            .send(Method::POST, "/send_question", Some(serde_json::json!({ "question": "   " })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Question cannot be empty");

        let (_, created) = client.send(Method::POST, "/sessions", Some(serde_json::json!({ "title": "Keep" }))).await;
        let id = created["session"]["id"].as_i64().unwrap();

        let (status, body) = client
            .send(Method::PUT, &format!("/sessions/{}/rename", id), Some(serde_json::json!({ "title": "" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Title cannot be empty");

        let (_, detail) = client.send(Method::GET, &format!("/sessions/{}", id), None).await;
        assert_eq!(detail["session"]["title"], "Keep");

        let (status, body) = client
            .send(Method::PUT, &format!("/sessions/{}/rename", id), Some(serde_json::json!({ "title": "Renamed" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["title"], "Renamed");

        let (status, _) = client.send(Method::GET, "/sessions/not-a-number", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = client.send(Method::GET, "/sessions/4242", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = client.send(Method::DELETE, "/sessions/4242", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_session_without_body_uses_default_title() {
        let mut client = Client::new(app());
        let (status, body) = client.send(Method::POST, "/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["session"]["title"].as_str().unwrap().starts_with("Session "));
    }

    #[tokio::test]
    async fn test_generation_failure_is_500() {
        let mut client = Client::new(app_with(StubProvider::failing("quota exceeded")));
        let (status, body) = client
            .send(Method::POST, "/send_question", Some(serde_json::json!({ "question": "Why Rust?" })))
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().starts_with("Text generation failed"));
    }

    #[tokio::test]
    async fn test_tampered_cookie_is_ignored() {
        let mut client = Client::new(app());
        client.send(Method::POST, "/sessions", Some(serde_json::json!({ "title": "Mine" }))).await;

        client.cookie = Some(format!("{}=forged1", ACTIVE_SESSION_COOKIE));
        let (_, current) = client.send(Method::GET, "/current_session", None).await;
        assert!(current["session"].is_null());
    }

    #[tokio::test]
    async fn test_follow_ups_and_improve_endpoints() {
        let mut client = Client::new(app_with(StubProvider::replying("Q1\nQ2\nQ3\nQ4")));

        let (status, body) = client
            .send(Method::POST, "/follow_up_questions", Some(serde_json::json!({ "topic": "Rust" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["questions"], serde_json::json!(["Q1", "Q2", "Q3"]));

        let (status, body) = client
            .send(
                Method::POST,
                "/improve_answer",
                Some(serde_json::json!({ "question": "Why Rust?", "answer": "Speed" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["question"], "Why Rust?");
        assert_eq!(body["answer"], "Q1\nQ2\nQ3\nQ4");

        let (status, _) = client
            .send(Method::POST, "/improve_answer", Some(serde_json::json!({ "question": "Why Rust?" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let service = SessionService::new(db, AnswerGenerator::new(Arc::new(StubProvider::replying("x")), 0.7));
        assert!(AppState::new(service, "too-short").is_err());
    }
}
