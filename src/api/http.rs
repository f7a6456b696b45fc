use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::types::*;
use crate::config::Config;
use crate::db::Db;
use crate::error::{KgraphError, Result};
use crate::generate::GenerationClient;
use crate::{graph, reconcile, store};

/// HTTP server wrapper
pub struct HttpServer {
    state: AppState,
    allowed_origins: Vec<String>,
    port: u16,
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    db: Arc<Db>,
    generator: Arc<GenerationClient>,
}

impl HttpServer {
    pub fn new(db: Db, generator: GenerationClient, config: &Config) -> Self {
        Self {
            state: AppState {
                db: Arc::new(db),
                generator: Arc::new(generator),
            },
            allowed_origins: config.http_server.allowed_origins.clone(),
            port: config.http_server.port,
        }
    }

    /// Run the HTTP server
    pub async fn run(&self) -> Result<()> {
        let app = self.create_router();

        let addr = format!("127.0.0.1:{}", self.port);
        log::info!("Starting kgraph server on http://{}", addr);
        log::info!("Graph API: http://{}/api/graph", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            let message = if e.kind() == std::io::ErrorKind::AddrInUse {
                format!(
                    "Port {} is already in use. Stop the other process or set http_server.port in config.toml.",
                    self.port
                )
            } else {
                format!("Failed to bind to {}: {}", addr, e)
            };
            KgraphError::Io(std::io::Error::new(e.kind(), message))
        })?;

        axum::serve(listener, app).await.map_err(|e| {
            KgraphError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP server error: {}", e),
            ))
        })?;

        Ok(())
    }

    /// Create the axum router
    fn create_router(&self) -> Router {
        // Empty allowed_origins = allow any, for the local viz front-end;
        // otherwise restrict to the configured list.
        let cors = if self.allowed_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<axum::http::HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/api/graph", get(handle_graph))
            .route("/api/nodes", get(handle_list_nodes).post(handle_create_node))
            .route(
                "/api/nodes/:id",
                get(handle_get_node).delete(handle_delete_node),
            )
            .route("/api/nodes/:id/edges", get(handle_node_edges))
            .route("/api/edges", get(handle_list_edges).post(handle_create_edge))
            .route("/api/expand", post(handle_expand))
            .route("/api/health", get(handle_health))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
            .with_state(self.state.clone())
    }
}

/// Map an error to its HTTP status and a JSON body with a human-readable
/// message plus the underlying cause.
fn error_response(err: KgraphError) -> Response {
    let (status, label) = match &err {
        KgraphError::Validation(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
        KgraphError::Generation(_) => (StatusCode::BAD_GATEWAY, "Generation service failed"),
        KgraphError::Parse(_) => (StatusCode::BAD_GATEWAY, "Generation response unusable"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    };

    if status.is_server_error() {
        log::error!("{}", err);
    } else {
        log::warn!("{}", err);
    }

    (
        status,
        Json(serde_json::json!({
            "error": label,
            "details": err.to_string(),
        })),
    )
        .into_response()
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("{} not found", what) })),
    )
        .into_response()
}

/// Full graph in the force-graph wire format
async fn handle_graph(State(state): State<AppState>) -> Response {
    match graph::get_full_graph(&state.db).await {
        Ok(snapshot) => (StatusCode::OK, Json(VizGraph::from(snapshot))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_list_nodes(State(state): State<AppState>) -> Response {
    match store::list_concepts(&state.db).await {
        Ok(concepts) => (StatusCode::OK, Json(concepts)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_create_node(
    State(state): State<AppState>,
    Json(req): Json<CreateNodeRequest>,
) -> Response {
    match store::create_concept(
        &state.db,
        &req.name,
        req.kind.as_deref(),
        req.description.as_deref(),
    )
    .await
    {
        Ok(concept) => (StatusCode::CREATED, Json(concept)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_get_node(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match store::get_concept_by_id(&state.db, id).await {
        Ok(Some(concept)) => (StatusCode::OK, Json(concept)).into_response(),
        Ok(None) => not_found("Concept"),
        Err(e) => error_response(e),
    }
}

async fn handle_delete_node(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match store::delete_concept(&state.db, id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found("Concept"),
        Err(e) => error_response(e),
    }
}

async fn handle_node_edges(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match store::get_concept_by_id(&state.db, id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found("Concept"),
        Err(e) => return error_response(e),
    }
    match store::relationships_for_concept(&state.db, id).await {
        Ok(edges) => (StatusCode::OK, Json(edges)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_list_edges(State(state): State<AppState>) -> Response {
    match store::list_relationships(&state.db).await {
        Ok(edges) => (StatusCode::OK, Json(edges)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_create_edge(
    State(state): State<AppState>,
    Json(req): Json<CreateEdgeRequest>,
) -> Response {
    match store::create_relationship(
        &state.db,
        req.src_id,
        &req.relation,
        req.dst_id,
        req.evidence.as_deref(),
    )
    .await
    {
        Ok(edge) => (StatusCode::CREATED, Json(edge)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Generate a candidate subgraph for a topic and merge it into the graph.
/// Partial persistence failures come back as 200 with a warning field; the
/// generated payload is never dropped.
async fn handle_expand(
    State(state): State<AppState>,
    Json(req): Json<ExpandRequest>,
) -> Response {
    if req.topic.trim().is_empty() {
        return error_response(KgraphError::Validation(
            "topic must not be empty".to_string(),
        ));
    }

    let known: Vec<String> = match store::list_concepts(&state.db).await {
        Ok(concepts) => concepts.into_iter().map(|c| c.name).collect(),
        Err(e) => return error_response(e),
    };

    let candidate = match state.generator.generate_candidate(&req.topic, &known).await {
        Ok(candidate) => candidate,
        Err(e) => return error_response(e),
    };

    log::info!(
        "Generated candidate for '{}': {} edge(s), {} concept(s)",
        candidate.topic,
        candidate.edges.len(),
        candidate.concepts.len()
    );

    match reconcile::reconcile(&state.db, candidate).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "kgraph",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let response = error_response(KgraphError::Validation("bad".to_string()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_generation_and_parse_map_to_502() {
        let response = error_response(KgraphError::Generation("down".to_string()));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = error_response(KgraphError::Parse("garbled".to_string()));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_storage_maps_to_500() {
        let response = error_response(KgraphError::Storage(rusqlite::Error::InvalidQuery));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_shape() {
        let response = not_found("Concept");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
