//! Mutating admission webhook
//!
//! The webhook is a thin transport around the pod mutator pipeline: it
//! decodes the AdmissionReview, hands the pod to the pipeline, and turns the
//! difference between the original and mutated pod into a JSON patch.

pub mod pod;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use meshprobe_mutation::MutatorPipeline;

/// Shared state for webhook handlers
pub struct WebhookState {
    /// Mutators applied to every admitted pod
    pub pipeline: MutatorPipeline,
}

impl WebhookState {
    /// Create a new webhook state with the given pipeline
    pub fn new(pipeline: MutatorPipeline) -> Self {
        Self { pipeline }
    }
}

/// Create the webhook router with all mutation endpoints
///
/// Currently supports:
/// - POST /mutate/pods - Mutate Pods with the registered mutators
/// - GET /healthz - Health check
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/mutate/pods", post(pod::mutate_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn integration_healthz() {
        let router = webhook_router(Arc::new(WebhookState::new(MutatorPipeline::new())));

        let request = Request::builder()
            .method("GET")
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn integration_unknown_route() {
        let router = webhook_router(Arc::new(WebhookState::new(MutatorPipeline::new())));

        let request = Request::builder()
            .method("POST")
            .uri("/mutate/deployments")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
