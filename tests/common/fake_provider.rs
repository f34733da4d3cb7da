//! Fake catalog provider lifecycle management
//!
//! Serves the Deezer and Jamendo resources the clients use from a random local
//! port. Responses are scripted per path and every request is recorded.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct FakeResponse {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl FakeResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: HashMap<String, String>,
}

#[derive(Default)]
struct FakeState {
    /// Scripted responses per path; the last one is repeated once the others are used up.
    responses: HashMap<String, VecDeque<FakeResponse>>,
    requests: Vec<RecordedRequest>,
}

type SharedState = Arc<Mutex<FakeState>>;

async fn handle(
    State(state): State<SharedState>,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let path = uri.path().to_string();
    let scripted = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            path: path.clone(),
            query,
        });
        state.responses.get_mut(&path).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
    };

    let Some(response) = scripted else {
        return (StatusCode::NOT_FOUND, format!("no response scripted for {}", path)).into_response();
    };
    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body,
    )
        .into_response()
}

/// Fake provider instance bound to a random local port.
///
/// When dropped, the server shuts down.
pub struct FakeProvider {
    /// Base URL to hand to a client (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    state: SharedState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeProvider {
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::new(Mutex::new(FakeState::default()));
        let app = Router::new()
            .route("/search", get(handle))
            .route("/artist/{id}/top", get(handle))
            .route("/tracks", get(handle))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake provider failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Replaces the scripted responses for `path`, served in order.
    pub fn respond_with(&self, path: &str, responses: Vec<FakeResponse>) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(path.to_string(), responses.into());
    }

    pub fn respond_json(&self, path: &str, status: u16, body: serde_json::Value) {
        self.respond_with(path, vec![FakeResponse::json(status, body)]);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

impl Drop for FakeProvider {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A base URL nothing listens on.
#[allow(dead_code)]
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let port = listener.local_addr().expect("Failed to get local address").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
