use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    clock::Clock,
    config::BookingConfig,
    contracts,
    domain::*,
    error::{AppError, Result},
    notifications::NotificationSink,
    payments::{PaymentGateway, PaymentLinkRequest},
    pricing::{self, cancellation, PricingInputs},
    repository::{BookingRepository, ListingRepository},
};

const MIN_EXPIRY_MINUTES: i64 = 5;
const MAX_EXPIRY_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone)]
pub struct CreateBookingInput {
    pub listing_id: Uuid,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub guest_count: i64,
    pub promo_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CancelBookingInput {
    pub reason: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_account_holder: Option<String>,
}

/// What the guest gets back from payment initiation: everything the client
/// needs to drive the hosted checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitiation {
    pub order_code: String,
    pub amount: i64,
    pub currency: String,
    pub provider: String,
    pub method: String,
    pub intent_id: String,
    pub checkout_url: String,
    pub qr_data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingPage {
    pub items: Vec<Booking>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// The booking state machine: creation, host decision, payment initiation,
/// cancellation settlement, refund confirmation, and the lazy expiry sweep.
/// Transition legality is enforced by status-preconditioned writes in the
/// repository; this layer decides targets, amounts, and side effects.
pub struct BookingService {
    booking_repo: Arc<dyn BookingRepository>,
    listing_repo: Arc<dyn ListingRepository>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    config: BookingConfig,
    base_url: String,
}

impl BookingService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        listing_repo: Arc<dyn ListingRepository>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        config: BookingConfig,
        base_url: String,
    ) -> Self {
        Self {
            booking_repo,
            listing_repo,
            gateway,
            notifier,
            clock,
            config,
            base_url,
        }
    }

    /// Today's date in the deployment's local offset; the sweep and
    /// cancellation tiers anchor on local days, not UTC.
    fn local_today(&self) -> NaiveDate {
        (self.clock.now() + Duration::hours(self.config.utc_offset_hours as i64)).date_naive()
    }

    async fn promo_discount(&self, code: &str, subtotal: i64) -> Result<i64> {
        let promotion = self
            .listing_repo
            .find_promotion(code)
            .await?
            .filter(|p| p.active)
            .filter(|p| p.expires_at.map_or(true, |at| at > self.clock.now()))
            .ok_or_else(|| AppError::Validation("Invalid or expired promo code".to_string()))?;
        Ok(pricing::round_pct(subtotal, promotion.discount_pct))
    }

    pub async fn create_booking(&self, guest: &User, input: CreateBookingInput) -> Result<Booking> {
        let listing = self
            .listing_repo
            .find_approved(input.listing_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Listing not found".to_string()))?;

        let nights = (input.checkout_date - input.checkin_date).num_days();
        if nights <= 0 {
            return Err(AppError::Validation("Invalid dates".to_string()));
        }
        if input.guest_count < 1 {
            return Err(AppError::Validation("Guest count must be at least 1".to_string()));
        }

        // UX pre-check only. The partial unique index is what actually
        // prevents a double booking under a race.
        if self
            .booking_repo
            .has_blocking_overlap(listing.id, input.checkin_date, input.checkout_date)
            .await?
        {
            return Err(AppError::Conflict("Dates already booked".to_string()));
        }

        let subtotal =
            listing.base_price * nights + listing.cleaning_fee + listing.service_fee;
        let discount = match &input.promo_code {
            Some(code) => self.promo_discount(code, subtotal).await?,
            None => 0,
        };

        let snapshot = pricing::quote(&PricingInputs {
            currency: self.config.currency.clone(),
            base_price_per_night: listing.base_price,
            nights,
            cleaning_fee: listing.cleaning_fee,
            service_fee: listing.service_fee,
            tax_pct: listing.tax_pct,
            platform_fee_pct: self.config.platform_fee_pct,
            discount,
        });

        let mut new_booking = NewBooking {
            guest_id: guest.id,
            host_id: listing.host_id,
            listing_id: listing.id,
            checkin_date: input.checkin_date,
            checkout_date: input.checkout_date,
            nights,
            guest_count: input.guest_count,
            pricing: snapshot,
            cancellation_policy: listing.cancellation_policy,
            contract_preview_hash: String::new(),
            requested_at: self.clock.now(),
        };
        new_booking.contract_preview_hash = contracts::preview_hash(&new_booking);

        let booking = self.booking_repo.create(new_booking).await?;

        self.notifier
            .notify(
                booking.host_id,
                "New booking request for your listing.",
                &format!("/host/bookings/{}", booking.id),
            )
            .await;

        Ok(booking)
    }

    pub async fn host_accept(
        &self,
        host: &User,
        id: Uuid,
        expires_in_minutes: Option<i64>,
    ) -> Result<Booking> {
        let minutes = expires_in_minutes
            .unwrap_or(self.config.default_expiry_minutes)
            .clamp(MIN_EXPIRY_MINUTES, MAX_EXPIRY_MINUTES);
        let now = self.clock.now();
        let expires_at = now + Duration::minutes(minutes);

        let changed = self
            .booking_repo
            .host_accept(id, host.id, expires_at, now)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::Conflict(
                    "These dates have just been booked. Please try again.".to_string(),
                ),
                other => other,
            })?;
        if changed == 0 {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }

        let booking = self.require_booking(id).await?;
        self.notifier
            .notify(
                booking.guest_id,
                "Your booking request was accepted. Please pay before it expires.",
                &format!("/my-bookings/{}", booking.id),
            )
            .await;

        Ok(booking)
    }

    pub async fn host_decline(&self, host: &User, id: Uuid) -> Result<Booking> {
        let changed = self
            .booking_repo
            .host_decline(id, host.id, self.clock.now())
            .await?;
        if changed == 0 {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }

        let booking = self.require_booking(id).await?;
        self.notifier
            .notify(
                booking.guest_id,
                "Unfortunately, your booking request was declined.",
                &format!("/my-bookings/{}", booking.id),
            )
            .await;

        Ok(booking)
    }

    pub async fn initiate_payment(
        &self,
        guest: &User,
        id: Uuid,
        provider: String,
        method: String,
    ) -> Result<PaymentInitiation> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| AppError::Provider("Payment processing is disabled".to_string()))?;

        let booking = self.require_booking(id).await?;
        if booking.guest_id != guest.id {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }
        if booking.status != BookingStatus::AwaitingPayment {
            return Err(AppError::Validation(
                "This booking is not available for payment.".to_string(),
            ));
        }

        let now = self.clock.now();
        if let Some(expires_at) = booking.expires_at {
            // Inline flavor of the lazy sweep: resolve the deadline on the
            // path that cares about it.
            if expires_at < now {
                self.booking_repo.mark_expired(id, now).await?;
                return Err(AppError::Validation("Booking expired".to_string()));
            }
        }

        let order_code = now.timestamp_millis().to_string();
        let id_hex = id.simple().to_string();
        // Provider caps the description length; last 8 hex chars identify
        // the booking well enough for bank statements.
        let short_id = &id_hex[24..];
        let link_request = PaymentLinkRequest {
            order_code: order_code.clone(),
            amount: booking.pricing.total,
            description: format!("TT Booking {short_id}"),
            return_url: format!(
                "{}/payment/success?orderCode={order_code}",
                self.base_url
            ),
            cancel_url: format!(
                "{}/payment/cancel?orderCode={order_code}",
                self.base_url
            ),
        };

        let link = gateway.create_payment_link(&link_request).await?;

        let payment = PaymentRecord {
            provider,
            method,
            intent_id: Some(link.intent_id.clone()),
            checkout_url: Some(link.checkout_url.clone()),
            qr_data: Some(link.qr_data.clone()),
            status: PaymentStatus::Pending,
            paid_at: None,
        };
        let changed = self
            .booking_repo
            .attach_payment_intent(id, &order_code, &payment, now)
            .await?;
        if changed == 0 {
            return Err(AppError::Conflict(
                "Booking state changed, please retry".to_string(),
            ));
        }

        Ok(PaymentInitiation {
            order_code,
            amount: booking.pricing.total,
            currency: booking.pricing.currency,
            provider: payment.provider,
            method: payment.method,
            intent_id: link.intent_id,
            checkout_url: link.checkout_url,
            qr_data: link.qr_data,
        })
    }

    pub async fn cancel(
        &self,
        guest: &User,
        id: Uuid,
        input: CancelBookingInput,
    ) -> Result<Booking> {
        let booking = self.require_booking(id).await?;
        if booking.guest_id != guest.id {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }

        let now = self.clock.now();
        match booking.status {
            BookingStatus::Requested
            | BookingStatus::HostAccepted
            | BookingStatus::AwaitingPayment => {
                let changed = self
                    .booking_repo
                    .cancel_unpaid(id, guest.id, input.reason.as_deref(), now)
                    .await?;
                if changed == 0 {
                    return Err(AppError::Conflict(
                        "Booking state changed, please retry".to_string(),
                    ));
                }
            }
            BookingStatus::Paid => {
                let bank = match (
                    input.bank_name.clone(),
                    input.bank_account_number.clone(),
                    input.bank_account_holder.clone(),
                ) {
                    (Some(bank_name), Some(account_number), Some(account_holder)) => BankSnapshot {
                        bank_name,
                        account_number,
                        account_holder,
                    },
                    _ => {
                        return Err(AppError::Validation(
                            "Bank details are required to refund a paid booking".to_string(),
                        ))
                    }
                };

                let checkin_at = cancellation::checkin_instant(
                    booking.checkin_date,
                    self.config.checkin_hour,
                    self.config.utc_offset_hours,
                );
                let quote = cancellation::refund_quote(
                    &booking.cancellation_policy,
                    booking.pricing.total,
                    self.config.platform_fee_pct,
                    checkin_at,
                    now,
                );

                tracing::info!(
                    booking_id = %id,
                    days_before_checkin = quote.days_before_checkin,
                    refund_pct = quote.refund_pct,
                    refund_amount = quote.refund_amount,
                    retained = quote.retained_amount,
                    "guest cancellation of paid booking"
                );

                let refund = RefundRecord {
                    bank,
                    amount: quote.refund_amount,
                    pct: quote.refund_pct,
                    reason: input.reason.clone(),
                    status: RefundStatus::Pending,
                };
                let changed = self
                    .booking_repo
                    .cancel_paid(id, guest.id, &refund, quote.platform_fee, quote.host_payout, now)
                    .await?;
                if changed == 0 {
                    return Err(AppError::Conflict(
                        "Booking state changed, please retry".to_string(),
                    ));
                }

                self.notifier
                    .notify(
                        booking.host_id,
                        "A paid booking was cancelled by the guest.",
                        &format!("/host/bookings/{}", booking.id),
                    )
                    .await;
            }
            // Cancelling an already-cancelled booking is a no-op success.
            BookingStatus::CancelledByGuest
            | BookingStatus::RefundPending
            | BookingStatus::Refunded => return Ok(booking),
            _ => {
                return Err(AppError::Conflict(
                    "Booking can no longer be cancelled".to_string(),
                ))
            }
        }

        self.require_booking(id).await
    }

    /// Operator confirmation that the refund transfer was executed.
    pub async fn confirm_refund(&self, id: Uuid) -> Result<Booking> {
        let booking = self.require_booking(id).await?;
        if booking.status == BookingStatus::Refunded {
            return Ok(booking);
        }

        let changed = self.booking_repo.confirm_refund(id, self.clock.now()).await?;
        if changed == 0 {
            return Err(AppError::Conflict(
                "Booking is not awaiting a refund".to_string(),
            ));
        }

        tracing::info!(booking_id = %id, "refund execution confirmed");
        self.require_booking(id).await
    }

    pub async fn get_booking(&self, viewer: &User, id: Uuid) -> Result<Booking> {
        let booking = self.require_booking(id).await?;
        self.gate_participant(viewer, &booking)?;
        Ok(booking)
    }

    pub async fn get_by_order_code(&self, viewer: &User, order_code: &str) -> Result<Booking> {
        let booking = self
            .booking_repo
            .find_by_order_code(order_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        self.gate_participant(viewer, &booking)?;
        Ok(booking)
    }

    pub async fn list_mine_guest(
        &self,
        guest: &User,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<BookingPage> {
        self.sweep(guest.id).await?;
        let (items, total) = self
            .booking_repo
            .list_by_guest(guest.id, status, limit, offset)
            .await?;
        Ok(BookingPage { items, total, limit, offset })
    }

    pub async fn list_mine_host(
        &self,
        host: &User,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<BookingPage> {
        self.sweep(host.id).await?;
        let (items, total) = self
            .booking_repo
            .list_by_host(host.id, status, limit, offset)
            .await?;
        Ok(BookingPage { items, total, limit, offset })
    }

    /// Lazy expiry: time-based transitions resolve at the next read, with
    /// staleness bounded by how often a participant looks at their list.
    async fn sweep(&self, user_id: Uuid) -> Result<()> {
        let swept = self
            .booking_repo
            .sweep_stale(user_id, self.local_today(), self.clock.now())
            .await?;
        if swept > 0 {
            tracing::debug!(%user_id, swept, "lazy expiry sweep applied transitions");
        }
        Ok(())
    }

    async fn require_booking(&self, id: Uuid) -> Result<Booking> {
        self.booking_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    fn gate_participant(&self, viewer: &User, booking: &Booking) -> Result<()> {
        let allowed = viewer.role == UserRole::Admin
            || booking.guest_id == viewer.id
            || booking.host_id == viewer.id;
        if allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}
