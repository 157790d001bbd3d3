use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use csv2sheet_core::event::StorageObjectEvent;
use csv2sheet_core::handler::{Csv2Sheet, HandleOutcome};
use csv2sheet_error::{Csv2SheetError, Result, ResultExt};
use csv2sheet_http::client::HttpClient;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const ENDPOINTS: Endpoints = Endpoints {
    healthz: "/healthz",
    event: "/",
};

#[derive(Debug)]
pub struct Endpoints {
    pub healthz: &'static str,
    pub event: &'static str,
}

/// State that's passed to all handlers.
#[derive(Debug)]
pub struct ServerState<C: HttpClient> {
    pub handler: Csv2Sheet<C>,
}

/// Error returned from a route, paired with the status to respond with.
#[derive(Debug)]
pub struct ServerError {
    status: StatusCode,
    err: Csv2SheetError,
}

pub type ServerResult<T> = std::result::Result<T, ServerError>;

impl ServerError {
    fn bad_request(err: Csv2SheetError) -> Self {
        ServerError {
            status: StatusCode::BAD_REQUEST,
            err,
        }
    }

    fn internal(err: Csv2SheetError) -> Self {
        ServerError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            err,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.err.get_msg() });
        (self.status, Json(body)).into_response()
    }
}

pub fn router<C: HttpClient>(state: Arc<ServerState<C>>) -> Router {
    Router::new()
        .route(ENDPOINTS.healthz, get(healthz))
        .route(ENDPOINTS.event, post(handle_event::<C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until ctrl-c or SIGTERM.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    let addr = listener.local_addr().context("Failed to get local address")?;
    info!(%addr, "serving storage events");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(%e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(%e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => (),
        _ = terminate => (),
    }
    info!("shutting down");
}

async fn healthz() -> &'static str {
    "OK"
}

async fn handle_event<C: HttpClient>(
    State(state): State<Arc<ServerState<C>>>,
    body: Bytes,
) -> ServerResult<Json<HandleOutcome>> {
    let event = StorageObjectEvent::from_json_slice(&body).map_err(ServerError::bad_request)?;

    match state.handler.handle(&event).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(err) => {
            error!(%event, %err, "failed to handle event");
            Err(ServerError::internal(err))
        }
    }
}
