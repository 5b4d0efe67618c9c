//! Error types for the admission webhook

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Error type for webhook operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// TLS material could not be loaded
    #[error("TLS error: {0}")]
    Tls(String),

    /// The HTTP server failed
    #[error("server error: {0}")]
    Server(String),

    /// A pod mutator failed
    #[error("mutation error: {0}")]
    Mutation(#[from] meshprobe_mutation::Error),

    /// Converting a pod to JSON failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The JSON patch could not be attached to the admission response
    #[error("patch error: {0}")]
    Patch(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Mutation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Config(_)
            | Error::Tls(_)
            | Error::Server(_)
            | Error::Serialization(_)
            | Error::Patch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // K8s-style Status response
        let body = serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": self.to_string(),
            "code": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}
