//! The MCP protocol endpoint.
//!
//! A stateless HTTP surface: every POST is authenticated against the
//! configured shared secret, then dispatched through a fresh MCP server
//! bound to the incident tools. Nothing survives the request; the only
//! process-wide state is the lazily-initialized store handle inside
//! portal-store.
//!
//! Hosting rewrites may deliver the endpoint path as either `/` or `/mcp`,
//! so both are routed identically.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use portal_auth::{authorize, AuthError, AuthSecret};
use portal_mcp::{incident_tools, McpError, McpRequest, McpServer};
use serde_json::json;
use tracing::{debug, error, warn};

/// Shared endpoint state: the configured secret only.
#[derive(Clone)]
pub struct AppState {
    /// Endpoint secret; `None` means the service is not configured and every
    /// request is rejected with a 503.
    pub secret: Option<AuthSecret>,
}

impl AppState {
    /// Read the endpoint configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            secret: AuthSecret::from_env(),
        }
    }
}

/// Build the endpoint router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            post(handle_mcp)
                .get(method_not_allowed)
                .delete(method_not_allowed),
        )
        .route(
            "/mcp",
            post(handle_mcp)
                .get(method_not_allowed)
                .delete(method_not_allowed),
        )
        .with_state(state)
}

/// Handle one MCP POST: authenticate, dispatch, respond.
async fn handle_mcp(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Err(e) = authenticate(&state, &headers) {
        return auth_failure(e);
    }

    let request: McpRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!("Rejected malformed JSON-RPC body: {}", e);
            return rpc_error(StatusCode::BAD_REQUEST, McpError::parse_error());
        }
    };

    if request.is_notification() {
        return StatusCode::ACCEPTED.into_response();
    }

    // Fresh server and tool set per request, discarded with the response.
    // Dispatch runs in its own task so that a panic inside a tool is caught
    // here and still produces exactly one response.
    let dispatch = tokio::spawn(async move {
        let server = McpServer::incident_portal();
        server.register_tools(incident_tools()).await;
        server.handle_request(request).await
    });

    match dispatch.await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("MCP dispatch failed: {}", e);
            rpc_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                McpError::internal_error("Internal server error"),
            )
        }
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<(), AuthError> {
    let authorization = header_str(headers, "authorization");
    let api_key = header_str(headers, "x-api-key");
    authorize(state.secret.as_ref(), authorization, api_key)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn auth_failure(err: AuthError) -> Response {
    if err.is_server_error() {
        error!("{}", err);
    } else {
        warn!("{}", err);
    }
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    rpc_error(status, McpError::new(err.rpc_code(), err.to_string()))
}

/// Fixed response for GET/DELETE on the endpoint paths; never touches
/// authentication or the tool registry.
async fn method_not_allowed() -> Response {
    rpc_error(
        StatusCode::METHOD_NOT_ALLOWED,
        McpError::service_unavailable("Method not allowed. Use POST for MCP."),
    )
}

fn rpc_error(status: StatusCode, error: McpError) -> Response {
    (
        status,
        Json(json!({
            "jsonrpc": "2.0",
            "error": error,
            "id": null,
        })),
    )
        .into_response()
}
