//! Pod Mutation Webhook
//!
//! Handles AdmissionReview requests for Pod resources. Pods that the mutator
//! pipeline leaves unchanged are allowed without a patch.

use std::sync::Arc;

use axum::{extract::State, Json};
use k8s_openapi::api::core::v1::Pod;
use kube::core::{
    admission::{AdmissionRequest, AdmissionResponse, AdmissionReview},
    DynamicObject,
};
use meshprobe_mutation::PodMutator;
use tracing::{debug, error, info};

use super::WebhookState;
use crate::{Error, Result};

/// Handle mutating admission review for Pods
///
/// Mutation failures deny the request with the error message rather than
/// admitting a half-rewritten pod.
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<Pod>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let req: AdmissionRequest<Pod> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let response = match review_pod(&state.pipeline, &req) {
        Ok(response) => response,
        Err(e) => {
            error!(uid = %req.uid, error = %e, "Pod mutation failed");
            AdmissionResponse::from(&req).deny(e.to_string())
        }
    };

    Json(response.into_review())
}

/// Run `mutator` over the request's pod and build the admission response
pub fn review_pod(
    mutator: &dyn PodMutator,
    request: &AdmissionRequest<Pod>,
) -> Result<AdmissionResponse> {
    let uid = &request.uid;

    let Some(pod) = &request.object else {
        debug!(uid = %uid, "No pod object in request, allowing unchanged");
        return Ok(AdmissionResponse::from(request));
    };

    let mutated = mutator.mutate(pod)?;
    let patch = build_patch(pod, &mutated)?;

    if patch.0.is_empty() {
        debug!(
            uid = %uid,
            pod = ?pod.metadata.name,
            namespace = ?request.namespace,
            "Pod unchanged, allowing"
        );
        return Ok(AdmissionResponse::from(request));
    }

    info!(
        uid = %uid,
        pod = ?pod.metadata.name,
        generate_name = ?pod.metadata.generate_name,
        namespace = ?request.namespace,
        patch_ops = patch.0.len(),
        "Applying patch to pod"
    );

    AdmissionResponse::from(request)
        .with_patch(patch)
        .map_err(|e| Error::Patch(e.to_string()))
}

/// RFC 6902 patch turning `original` into `mutated`
pub fn build_patch(original: &Pod, mutated: &Pod) -> Result<json_patch::Patch> {
    let before = serde_json::to_value(original)?;
    let after = serde_json::to_value(mutated)?;
    Ok(json_patch::diff(&before, &after))
}
