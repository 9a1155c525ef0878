//! Local HTTP server answering canned JSON, for exercising `ApiClient`
//! end to end in tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::Value;

use super::ApiClient;

/// A request the server received.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Routes {
    replies: HashMap<(Method, String), (StatusCode, Option<Value>)>,
    requests: Vec<Recorded>,
}

type Shared = Arc<Mutex<Routes>>;

pub struct TestServer {
    base_url: String,
    routes: Shared,
}

impl TestServer {
    /// Bind a random local port and serve until the runtime shuts down.
    pub async fn start() -> Self {
        let routes = Shared::default();
        let app = Router::new().fallback(answer).with_state(routes.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("test server address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            routes,
        }
    }

    /// Answer `method path` with a JSON body.
    pub fn json(&self, method: Method, path: &str, status: StatusCode, body: Value) -> &Self {
        self.insert(method, path, status, Some(body))
    }

    /// Answer `method path` with an empty body.
    pub fn empty(&self, method: Method, path: &str, status: StatusCode) -> &Self {
        self.insert(method, path, status, None)
    }

    fn insert(&self, method: Method, path: &str, status: StatusCode, body: Option<Value>) -> &Self {
        self.routes
            .lock()
            .expect("routes lock")
            .replies
            .insert((method, path.to_string()), (status, body));
        self
    }

    /// Client rooted at this server, already carrying a token.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url)
            .expect("client should build")
            .with_token("test-token".to_string())
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.routes.lock().expect("routes lock").requests.clone()
    }
}

/// Unknown routes answer 404 so a wrong path shows up as `ApiError::NotFound`.
async fn answer(State(routes): State<Shared>, method: Method, uri: Uri, body: Bytes) -> Response {
    let mut routes = routes.lock().expect("routes lock");
    routes.requests.push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    });
    match routes.replies.get(&(method, uri.path().to_string())) {
        Some((status, Some(json))) => (*status, Json(json.clone())).into_response(),
        Some((status, None)) => status.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
