//! REST bridge
//!
//! Lets services that cannot speak MCP append events over plain HTTP. Shares
//! the facade with the MCP server, so defaults and validation are identical.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use switchboard_core::facade::{AppendArgs, Appended, ErrorBody, ErrorReply, Reply};
use switchboard_core::{FacadeError, StreamFacade};

/// Body of `POST /publish`
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub stream: Option<String>,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub redis: String,
}

/// Error that converts to an HTTP response with an `{ok: false, error}` body
pub struct BridgeError {
    status: StatusCode,
    body: ErrorReply,
}

impl From<FacadeError> for BridgeError {
    fn from(err: FacadeError) -> Self {
        let status = match err {
            FacadeError::Validation(_) => StatusCode::BAD_REQUEST,
            FacadeError::Operational(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            body: ErrorReply::from(&err),
        }
    }
}

impl From<JsonRejection> for BridgeError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorReply {
                ok: false,
                error: ErrorBody {
                    kind: "validation".to_string(),
                    code: None,
                    message: rejection.body_text(),
                },
            },
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn router(facade: Arc<StreamFacade>) -> Router {
    Router::new()
        .route("/publish", post(publish))
        .route("/healthz", get(healthz))
        .with_state(facade)
}

async fn publish(
    State(facade): State<Arc<StreamFacade>>,
    body: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<Json<Reply<Appended>>, BridgeError> {
    let Json(request) = body?;
    let args = AppendArgs {
        stream: request.stream,
        fields: request.fields,
        id: None,
    };
    let reply = facade.append(args).await.map_err(|err| {
        tracing::warn!("publish failed: {}", err);
        BridgeError::from(err)
    })?;
    Ok(Json(reply))
}

async fn healthz(
    State(facade): State<Arc<StreamFacade>>,
) -> Result<Json<HealthResponse>, BridgeError> {
    let reply = facade.ping().await?;
    Ok(Json(HealthResponse {
        redis: reply.body.pong,
    }))
}

/// Serve the bridge until the process is stopped
pub async fn serve(facade: Arc<StreamFacade>, listen: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!("REST bridge listening on {}", listener.local_addr()?);
    axum::serve(listener, router(facade)).await?;
    Ok(())
}
