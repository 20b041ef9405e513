//! HTTP gateway for Folio.
//!
//! Routes:
//! - `POST /query`: answer a question (JSON body or `?query=` parameters)
//! - `GET /health`: liveness and index size
//!
//! Built on Axum. Conversation histories are kept per session in memory.

pub mod session;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::{
    Router,
    routing::{get, post},
};
use folio_agent::{AgentError, PortfolioAgent};
use folio_config::{AppConfig, GatewayConfig};
use folio_index::DocumentIndexer;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub use session::{DEFAULT_SESSION, SessionStore};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub agent: Arc<PortfolioAgent>,
    pub indexer: Arc<DocumentIndexer>,
    pub sessions: SessionStore,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(agent: Arc<PortfolioAgent>, indexer: Arc<DocumentIndexer>, max_sessions: usize) -> Self {
        Self {
            agent,
            indexer,
            sessions: SessionStore::new(max_sessions),
        }
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    let router = Router::new()
        .route("/query", post(query_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes));

    let router = match cors_layer(&config.allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600)),
    )
}

/// Start the gateway HTTP server and run until Ctrl-C.
pub async fn start(
    config: &AppConfig,
    agent: Arc<PortfolioAgent>,
    indexer: Arc<DocumentIndexer>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState::new(agent, indexer, config.gateway.max_sessions));
    let app = build_router(state, &config.gateway);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

// --- Errors ---

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// A failed request: status code plus `{"error": ..}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        let status = match err {
            AgentError::EmptyQuery => StatusCode::BAD_REQUEST,
            AgentError::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
            AgentError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

// --- Handlers ---

/// Body or URL parameters of `POST /query`.
#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
}

async fn query_handler(
    State(state): State<SharedState>,
    Query(params): Query<QueryRequest>,
    body: Bytes,
) -> Result<Json<QueryResponse>, ApiError> {
    let from_body = if body.iter().all(u8::is_ascii_whitespace) {
        QueryRequest::default()
    } else {
        serde_json::from_slice::<QueryRequest>(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))?
    };

    let query = from_body
        .query
        .or(params.query)
        .ok_or_else(|| ApiError::bad_request("Missing 'query'"))?;
    let session_id = from_body
        .session_id
        .or(params.session_id)
        .unwrap_or_else(|| DEFAULT_SESSION.to_string());

    let handle = state
        .sessions
        .get_or_create(&session_id, || state.agent.new_history())
        .await;
    let mut history = handle.lock().await;

    match state.agent.handle_query(&query, &mut history).await {
        Ok(response) => Ok(Json(QueryResponse { response })),
        Err(e) => {
            warn!(session = %session_id, error = %e, "Query failed");
            Err(e.into())
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub indexed_chunks: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        indexed_chunks: state.indexer.len().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use folio_agent::ConversationHistory;
    use folio_core::error::ProviderError;
    use folio_core::message::Message;
    use folio_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use folio_index::IndexSettings;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// Echoes the last user message, or fails when told to.
    struct EchoProvider {
        fail: bool,
    }

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            if self.fail {
                return Err(ProviderError::Network("connection refused".into()));
            }
            let last = request
                .messages
                .last()
                .map(|m| m.content().to_string())
                .unwrap_or_default();
            Ok(ProviderResponse {
                message: Message::assistant(format!("echo: {last}")),
                usage: None,
                model: "echo-1".into(),
            })
        }
    }

    struct TestApp {
        router: Router,
        state: SharedState,
        _dir: tempfile::TempDir,
    }

    async fn test_app(build_index: bool, fail: bool) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("documents");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("allocation.txt"), "Doc: 20% bonds, 80% equities.").unwrap();

        let settings = IndexSettings {
            documents_dir: docs,
            snapshot_path: dir.path().join("embeddings/index.jsonl"),
            extensions: vec!["txt".into()],
            chunk_size: 512,
            chunk_overlap: 50,
            embedding_model: None,
            top_k: 3,
            min_score: 0.0,
        };
        let indexer = Arc::new(DocumentIndexer::new(settings, None));
        if build_index {
            indexer.build().await.unwrap();
        }

        let agent = Arc::new(PortfolioAgent::new(
            Arc::new(EchoProvider { fail }),
            indexer.clone(),
            "echo-1",
        ));
        let state = Arc::new(GatewayState::new(agent, indexer, 100));

        TestApp {
            router: build_router(state.clone(), &GatewayConfig::default()),
            state,
            _dir: dir,
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_indexed_chunks() {
        let app = test_app(true, false).await;
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["indexed_chunks"], 1);
    }

    #[tokio::test]
    async fn query_with_json_body() {
        let app = test_app(true, false).await;
        let req = post_json("/query", serde_json::json!({"query": "What is my bond allocation?"}));

        let (status, body) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "echo: What is my bond allocation?");
    }

    #[tokio::test]
    async fn query_with_url_parameters() {
        let app = test_app(true, false).await;
        let req = Request::builder()
            .method("POST")
            .uri("/query?query=bonds%3F&session_id=s1")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "echo: bonds?");
    }

    #[tokio::test]
    async fn sessions_keep_separate_histories() {
        let app = test_app(true, false).await;

        for (query, session) in [("Bonds?", "alice"), ("Equities?", "bob"), ("Cash?", "alice")] {
            let req = post_json("/query", serde_json::json!({"query": query, "session_id": session}));
            let (status, _) = send(&app.router, req).await;
            assert_eq!(status, StatusCode::OK);
        }

        let sessions = &app.state.sessions;
        assert_eq!(sessions.len().await, 2);
        let alice = sessions.get_or_create("alice", ConversationHistory::new).await;
        let alice: Vec<String> = alice
            .lock()
            .await
            .messages()
            .map(|m| m.content().to_string())
            .collect();
        assert_eq!(alice, vec!["Bonds?", "echo: Bonds?", "Cash?", "echo: Cash?"]);

        let bob = sessions.get_or_create("bob", ConversationHistory::new).await;
        assert_eq!(bob.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn query_without_session_uses_default() {
        let app = test_app(true, false).await;
        let req = post_json("/query", serde_json::json!({"query": "Bonds?"}));
        send(&app.router, req).await;

        assert!(app.state.sessions.contains(DEFAULT_SESSION).await);
    }

    #[tokio::test]
    async fn missing_query_is_bad_request() {
        let app = test_app(true, false).await;
        let req = post_json("/query", serde_json::json!({"session_id": "s1"}));

        let (status, body) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing 'query'");
    }

    #[tokio::test]
    async fn blank_query_is_bad_request() {
        let app = test_app(true, false).await;
        let req = post_json("/query", serde_json::json!({"query": "   "}));

        let (status, body) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Query must not be empty");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = test_app(true, false).await;
        let req = Request::builder()
            .method("POST")
            .uri("/query")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn unbuilt_index_is_service_unavailable() {
        let app = test_app(false, false).await;
        let req = post_json("/query", serde_json::json!({"query": "Bonds?"}));

        let (status, body) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Index not initialized");
    }

    #[tokio::test]
    async fn provider_failure_is_bad_gateway() {
        let app = test_app(true, true).await;
        let req = post_json("/query", serde_json::json!({"query": "Bonds?"}));

        let (status, body) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Generation failed: Network error: connection refused");
    }

    #[test]
    fn invalid_cors_origins_are_ignored() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["bad\norigin".into()]).is_none());
        assert!(cors_layer(&["http://localhost:3000".into()]).is_some());
    }
}
