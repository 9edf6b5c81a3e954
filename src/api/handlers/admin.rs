use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Booking, HostSettlement, PayoutBatch},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct SettlementParams {
    batch_id: Option<Uuid>,
}

pub async fn latest_batch(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
) -> Result<Json<PayoutBatch>> {
    let batch = state.service_context.payout_service.latest_batch().await?;
    Ok(Json(batch))
}

pub async fn list_settlements(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
    Query(params): Query<SettlementParams>,
) -> Result<Json<Vec<HostSettlement>>> {
    let settlements = state
        .service_context
        .payout_service
        .list_settlements(params.batch_id)
        .await?;
    Ok(Json(settlements))
}

pub async fn confirm_settlement(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<HostSettlement>> {
    let settlement = state
        .service_context
        .payout_service
        .confirm_settlement(id)
        .await?;
    Ok(Json(settlement))
}

pub async fn confirm_refund(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking = state
        .service_context
        .booking_service
        .confirm_refund(id)
        .await?;
    Ok(Json(booking))
}
