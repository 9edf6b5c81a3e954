use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};

use crate::{
    api::state::AppState,
    error::Result,
    payments::reconciler::WebhookAck,
};

/// Provider payment webhook. Unauthenticated by design: trust comes from the
/// HMAC signature over the raw body, so the payload must reach the
/// reconciler byte-for-byte as received.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get("x-payos-signature")
        .and_then(|v| v.to_str().ok());
    let ack = state.service_context.reconciler.process(&body, signature).await?;
    Ok(Json(ack))
}
