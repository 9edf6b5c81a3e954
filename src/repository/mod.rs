use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod booking_repository;
pub mod listing_repository;
pub mod payout_repository;
pub mod user_repository;

pub use booking_repository::SqliteBookingRepository;
pub use listing_repository::SqliteListingRepository;
pub use payout_repository::SqlitePayoutRepository;
pub use user_repository::SqliteUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn create(&self, listing: Listing) -> Result<Listing>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>>;
    /// Only approved listings are bookable.
    async fn find_approved(&self, id: Uuid) -> Result<Option<Listing>>;
    async fn find_promotion(&self, code: &str) -> Result<Option<Promotion>>;
    async fn create_promotion(&self, promotion: Promotion) -> Result<Promotion>;
}

/// Fields the reconciler stamps when a success webhook lands.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub provider_txn_id: String,
    pub amount: i64,
    pub raw: String,
    pub occurred_at: DateTime<Utc>,
}

/// Per-booking revenue row scanned by the payout aggregator.
#[derive(Debug, Clone)]
pub struct RevenueRow {
    pub host_id: Uuid,
    pub total: i64,
    pub refund_amount: i64,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: NewBooking) -> Result<Booking>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;
    async fn find_by_order_code(&self, order_code: &str) -> Result<Option<Booking>>;
    async fn list_by_guest(
        &self,
        guest_id: Uuid,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Booking>, i64)>;
    async fn list_by_host(
        &self,
        host_id: Uuid,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Booking>, i64)>;

    /// Half-open overlap test against the blocking status set. Advisory
    /// only; the partial unique index is the canonical guarantee.
    async fn has_blocking_overlap(
        &self,
        listing_id: Uuid,
        checkin: NaiveDate,
        checkout: NaiveDate,
    ) -> Result<bool>;

    /// `requested` -> `awaiting_payment`, arming the expiry deadline.
    /// Returns the affected row count; zero means the booking was not this
    /// host's pending request (already decided, or not theirs).
    async fn host_accept(
        &self,
        id: Uuid,
        host_id: Uuid,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64>;

    /// `requested` -> `host_rejected`.
    async fn host_decline(&self, id: Uuid, host_id: Uuid, now: DateTime<Utc>) -> Result<u64>;

    /// Stores the provider intent on an `awaiting_payment` booking.
    async fn attach_payment_intent(
        &self,
        id: Uuid,
        order_code: &str,
        payment: &PaymentRecord,
        now: DateTime<Utc>,
    ) -> Result<u64>;

    /// `awaiting_payment` past its deadline, found inline on the pay path.
    async fn mark_expired(&self, id: Uuid, now: DateTime<Utc>) -> Result<u64>;

    /// Success webhook: payment succeeded + `paid` + one appended receipt,
    /// atomically. Preconditioned on a pre-payment status so a racing
    /// duplicate is a no-op (zero rows, no receipt written).
    async fn mark_paid(&self, id: Uuid, receipt: &PaymentReceipt) -> Result<u64>;

    /// Appends a receipt without touching the booking. For money that
    /// arrived after the booking left the payable states; the status tells
    /// ops it needs manual reconciliation.
    async fn record_receipt(&self, booking_id: Uuid, receipt: &PaymentReceipt) -> Result<()>;

    /// Failure webhook: payment failed, booking stays retryable.
    async fn mark_payment_failed(&self, id: Uuid, now: DateTime<Utc>) -> Result<u64>;

    async fn set_contract_executed(
        &self,
        id: Uuid,
        executed_at: DateTime<Utc>,
        pdf_key: &str,
        pdf_url: &str,
    ) -> Result<u64>;

    /// Unpaid guest cancellation: terminal `cancelled_by_guest`, payout and
    /// fee fields zeroed, no refund bookkeeping.
    async fn cancel_unpaid(
        &self,
        id: Uuid,
        guest_id: Uuid,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<u64>;

    /// Paid guest cancellation: `refund_pending` with the refund record and
    /// recomputed payout/fee fields (the only post-creation rewrite of the
    /// pricing snapshot).
    #[allow(clippy::too_many_arguments)]
    async fn cancel_paid(
        &self,
        id: Uuid,
        guest_id: Uuid,
        refund: &RefundRecord,
        new_platform_fee: i64,
        new_host_payout: i64,
        now: DateTime<Utc>,
    ) -> Result<u64>;

    /// Operator confirmation of refund execution: `refund_pending` ->
    /// `refunded`, refund record stamped completed.
    async fn confirm_refund(&self, id: Uuid, now: DateTime<Utc>) -> Result<u64>;

    /// Lazy expiry sweep over one participant's bookings, run before list
    /// queries. Applies the time-based transitions: payment deadline elapsed,
    /// request stale past check-in, stay completed past checkout.
    async fn sweep_stale(&self, user_id: Uuid, today: NaiveDate, now: DateTime<Utc>)
        -> Result<u64>;

    async fn list_txns(&self, booking_id: Uuid) -> Result<Vec<BookingTxn>>;

    /// Revenue-bearing bookings whose checkout falls inside [from, to).
    async fn revenue_rows(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<RevenueRow>>;
}

#[derive(Debug, Clone)]
pub struct NewSettlement {
    pub host_id: Uuid,
    pub bank: Option<BankSnapshot>,
    pub total_bookings: i64,
    pub total_net_revenue: i64,
    pub platform_fee: i64,
    pub payout_amount: i64,
}

#[async_trait]
pub trait PayoutRepository: Send + Sync {
    async fn find_batch(&self, month: u32, year: i32) -> Result<Option<PayoutBatch>>;

    /// Batch and its settlement rows land in one transaction. A concurrent
    /// creator loses on unique(month, year) and gets a Conflict the caller
    /// resolves by re-fetching.
    async fn create_batch(
        &self,
        batch: PayoutBatch,
        settlements: Vec<NewSettlement>,
    ) -> Result<PayoutBatch>;

    async fn list_settlements(&self, batch_id: Uuid) -> Result<Vec<HostSettlement>>;
    async fn find_settlement(&self, id: Uuid) -> Result<Option<HostSettlement>>;

    /// Marks one settlement paid and bumps the batch's paid counter,
    /// completing the batch when the counter reaches the settlement total.
    /// Duplicate confirmation is a Conflict.
    async fn confirm_settlement(&self, id: Uuid, now: DateTime<Utc>) -> Result<HostSettlement>;
}
