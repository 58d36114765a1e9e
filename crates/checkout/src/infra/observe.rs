//! Observability of the checkout. Each function stands for an event that is
//! meaningful to the system and is called where that event happens, so that
//! log levels and fields are decided in one place.

use {
    crate::{
        domain::{
            checkout::{self, Invalid, Phase},
            validation::{FieldId, ValidationError},
        },
        infra::api,
    },
    reqwest::{StatusCode, header::HeaderValue},
    url::Url,
};

/// Observe that a validation error was recorded for a field.
pub fn validation_error_set(field: &FieldId, error: &ValidationError) {
    tracing::trace!(%field, message = %error.message, hidden = error.hidden, "validation error");
}

pub fn field_mounted(field: &FieldId) {
    tracing::trace!(%field, "field mounted");
}

pub fn field_validated(field: &FieldId, valid: bool) {
    tracing::trace!(%field, valid, "field validated");
}

pub fn field_unmounted(field: &FieldId) {
    tracing::trace!(%field, "field unmounted");
}

/// Observe a checkout phase transition.
pub fn phase_changed(action: &str, before: Phase, after: Phase) {
    tracing::debug!(action, %before, %after, "checkout phase changed");
}

/// Observe that an action was not allowed in the current phase.
pub fn action_ignored(action: &str, phase: Phase) {
    tracing::debug!(action, %phase, "ignored checkout action");
}

/// Observe that a before-processing observer objected to the attempt.
pub fn before_processing_failed(invalid: &Invalid) {
    tracing::info!(%invalid, "checkout attempt rejected before processing");
}

pub fn invalid_redirect_url(raw: &str, err: &url::ParseError) {
    tracing::warn!(raw, ?err, "ignoring invalid redirect URL");
}

pub fn redirecting(url: &Url) {
    tracing::info!(%url, "redirecting");
}

/// Observe that notices were suppressed or unsuppressed because an express
/// payment method took over the checkout.
pub fn notices_suppressed(suppressed: bool) {
    tracing::debug!(suppressed, "notice suppression changed");
}

/// Observe that the order is about to be submitted.
pub fn submitting(payload: &api::Payload) {
    tracing::info!(
        payment_method = payload.payment_method.as_deref().unwrap_or("none"),
        "submitting order"
    );
}

/// Observe that a submission was skipped because one is already in flight.
pub fn submission_in_flight() {
    tracing::trace!("order submission already in flight");
}

pub fn store_api_request(endpoint: &Url, payload: &api::Payload) {
    tracing::trace!(%endpoint, ?payload, "sending store API request");
}

pub fn store_api_response(status: StatusCode, body: &str) {
    tracing::trace!(%status, body, "received store API response");
}

pub fn nonce_updated() {
    tracing::trace!("store API nonce updated");
}

pub fn invalid_customer_id(raw: &HeaderValue) {
    tracing::warn!(?raw, "ignoring invalid customer id header");
}

/// Observe the outcome of a submission that reached the Store API.
pub fn submitted(response: &checkout::Response) {
    if response.is_success() {
        tracing::info!(status = ?response.status, "order placed");
    } else {
        tracing::info!(
            status = ?response.status,
            payment_status = response.payment_status(),
            "order not placed"
        );
    }
}

/// Observe that a submission failed.
pub fn submission_failed(err: &api::Error) {
    match err {
        api::Error::Rejected(response) => {
            tracing::info!(status = %response.status, "store API rejected order")
        }
        err => tracing::warn!(?err, "order submission failed"),
    }
}

/// Observe that a response body could not be parsed as JSON.
pub fn unparsable_body(err: &serde_json::Error) {
    tracing::warn!(?err, "store API response body is not JSON");
}

pub fn processor_stopped() {
    tracing::debug!("checkout processor stopped, inputs closed");
}
