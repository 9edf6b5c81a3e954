use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Booking, BookingStatus},
    error::{AppError, Result},
    service::{BookingPage, CancelBookingInput, CreateBookingInput, PaymentInitiation},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingBody {
    pub listing_id: Uuid,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    #[validate(range(min = 1, max = 20))]
    pub guest_count: i64,
    #[validate(length(min = 1, max = 64))]
    pub promo_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HostAcceptBody {
    /// Payment window in minutes; bounded to keep dates from being held
    /// hostage by an unpaid booking.
    #[validate(range(min = 5, max = 1440))]
    pub expires_in_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentBody {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_provider() -> String {
    "payos".to_string()
}

fn default_method() -> String {
    "qr".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CancelBookingBody {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub bank_name: Option<String>,
    #[validate(length(min = 4, max = 32))]
    pub bank_account_number: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub bank_account_holder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
    status: Option<String>,
}

fn default_limit() -> i64 {
    20
}

impl ListParams {
    fn status_filter(&self) -> Result<Option<BookingStatus>> {
        match &self.status {
            None => Ok(None),
            Some(raw) => BookingStatus::parse(raw)
                .map(Some)
                .ok_or_else(|| AppError::Validation(format!("Unknown status: {raw}"))),
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<Booking>)> {
    body.validate()?;
    let booking = state
        .service_context
        .booking_service
        .create_booking(
            &current.user,
            CreateBookingInput {
                listing_id: body.listing_id,
                checkin_date: body.checkin_date,
                checkout_date: body.checkout_date,
                guest_count: body.guest_count,
                promo_code: body.promo_code,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking = state
        .service_context
        .booking_service
        .get_booking(&current.user, id)
        .await?;
    Ok(Json(booking))
}

pub async fn get_by_order_code(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(order_code): Path<String>,
) -> Result<Json<Booking>> {
    let booking = state
        .service_context
        .booking_service
        .get_by_order_code(&current.user, &order_code)
        .await?;
    Ok(Json(booking))
}

pub async fn list_mine(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<BookingPage>> {
    let status = params.status_filter()?;
    let page = state
        .service_context
        .booking_service
        .list_mine_guest(&current.user, status, params.limit, params.offset)
        .await?;
    Ok(Json(page))
}

pub async fn list_host(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<BookingPage>> {
    let status = params.status_filter()?;
    let page = state
        .service_context
        .booking_service
        .list_mine_host(&current.user, status, params.limit, params.offset)
        .await?;
    Ok(Json(page))
}

pub async fn host_accept(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<HostAcceptBody>,
) -> Result<Json<Booking>> {
    body.validate()?;
    let booking = state
        .service_context
        .booking_service
        .host_accept(&current.user, id, body.expires_in_minutes)
        .await?;
    Ok(Json(booking))
}

pub async fn host_decline(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking = state
        .service_context
        .booking_service
        .host_decline(&current.user, id)
        .await?;
    Ok(Json(booking))
}

pub async fn initiate_payment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<InitiatePaymentBody>,
) -> Result<Json<PaymentInitiation>> {
    let initiation = state
        .service_context
        .booking_service
        .initiate_payment(&current.user, id, body.provider, body.method)
        .await?;
    Ok(Json(initiation))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<CancelBookingBody>,
) -> Result<Json<Booking>> {
    body.validate()?;
    let booking = state
        .service_context
        .booking_service
        .cancel(
            &current.user,
            id,
            CancelBookingInput {
                reason: body.reason,
                bank_name: body.bank_name,
                bank_account_number: body.bank_account_number,
                bank_account_holder: body.bank_account_holder,
            },
        )
        .await?;
    Ok(Json(booking))
}
