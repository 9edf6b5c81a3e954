use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reservation lifecycle. A booking is never hard-deleted; every transition
/// is a status change stamped with a timestamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Requested,
    HostAccepted,
    HostRejected,
    Expired,
    AwaitingPayment,
    PaymentProcessing,
    Paid,
    Completed,
    CancelledByGuest,
    CancelledByHost,
    RefundPending,
    Refunded,
}

impl BookingStatus {
    /// Statuses that hold a listing's date window against new bookings.
    /// This set scopes the partial unique index in the schema; the two must
    /// stay in lockstep.
    pub const BLOCKING: [BookingStatus; 4] = [
        BookingStatus::AwaitingPayment,
        BookingStatus::PaymentProcessing,
        BookingStatus::Paid,
        BookingStatus::Completed,
    ];

    /// Statuses counted by the payout aggregator as revenue-bearing.
    pub const REVENUE_BEARING: [BookingStatus; 5] = [
        BookingStatus::Completed,
        BookingStatus::Paid,
        BookingStatus::Refunded,
        BookingStatus::CancelledByGuest,
        BookingStatus::CancelledByHost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "requested",
            BookingStatus::HostAccepted => "host_accepted",
            BookingStatus::HostRejected => "host_rejected",
            BookingStatus::Expired => "expired",
            BookingStatus::AwaitingPayment => "awaiting_payment",
            BookingStatus::PaymentProcessing => "payment_processing",
            BookingStatus::Paid => "paid",
            BookingStatus::Completed => "completed",
            BookingStatus::CancelledByGuest => "cancelled_by_guest",
            BookingStatus::CancelledByHost => "cancelled_by_host",
            BookingStatus::RefundPending => "refund_pending",
            BookingStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<BookingStatus> {
        match s {
            "requested" => Some(BookingStatus::Requested),
            "host_accepted" => Some(BookingStatus::HostAccepted),
            "host_rejected" => Some(BookingStatus::HostRejected),
            "expired" => Some(BookingStatus::Expired),
            "awaiting_payment" => Some(BookingStatus::AwaitingPayment),
            "payment_processing" => Some(BookingStatus::PaymentProcessing),
            "paid" => Some(BookingStatus::Paid),
            "completed" => Some(BookingStatus::Completed),
            "cancelled_by_guest" => Some(BookingStatus::CancelledByGuest),
            "cancelled_by_host" => Some(BookingStatus::CancelledByHost),
            "refund_pending" => Some(BookingStatus::RefundPending),
            "refunded" => Some(BookingStatus::Refunded),
            _ => None,
        }
    }

    pub fn is_blocking(&self) -> bool {
        Self::BLOCKING.contains(self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    None,
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::None => "none",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "none" => Some(PaymentStatus::None),
            "pending" => Some(PaymentStatus::Pending),
            "succeeded" => Some(PaymentStatus::Succeeded),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// Money amounts are integer units of the deployment currency (VND has no
/// subunit, so 1 == 1 dong).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingSnapshot {
    pub currency: String,
    pub base_price_per_night: i64,
    pub cleaning_fee: i64,
    pub service_fee: i64,
    pub tax_pct: f64,
    pub subtotal: i64,
    pub tax: i64,
    pub platform_fee: i64,
    pub discount: i64,
    pub total: i64,
    pub host_payout: i64,
}

/// Refund percent per days-to-checkin tier, snapshotted from the listing at
/// booking creation. Four or more days always refunds 100%, day zero 0%.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancellationPolicy {
    pub refund_pct_3_days: i64,
    pub refund_pct_2_days: i64,
    pub refund_pct_1_day: i64,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            refund_pct_3_days: 90,
            refund_pct_2_days: 50,
            refund_pct_1_day: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub provider: String,
    pub method: String,
    pub intent_id: Option<String>,
    pub checkout_url: Option<String>,
    pub qr_data: Option<String>,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Completed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<RefundStatus> {
        match s {
            "pending" => Some(RefundStatus::Pending),
            "completed" => Some(RefundStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRecord {
    pub bank: BankSnapshot,
    pub amount: i64,
    pub pct: i64,
    pub reason: Option<String>,
    pub status: RefundStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    pub preview_hash: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
    pub pdf_key: Option<String>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub listing_id: Uuid,
    pub status: BookingStatus,

    /// Stay window, half-open: [checkin, checkout).
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub nights: i64,
    pub guest_count: i64,

    pub pricing: PricingSnapshot,
    pub cancellation_policy: CancellationPolicy,

    pub order_code: Option<String>,
    pub payment: PaymentRecord,
    pub refund: Option<RefundRecord>,
    pub contract: ContractRecord,

    pub expires_at: Option<DateTime<Utc>>,
    pub requested_at: DateTime<Utc>,
    pub host_responded_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only provider transaction receipt, written by the reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingTxn {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider_txn_id: String,
    pub amount: i64,
    pub status: String,
    pub raw: String,
    pub occurred_at: DateTime<Utc>,
}

/// Everything the repository needs to persist a fresh `requested` booking.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub listing_id: Uuid,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub nights: i64,
    pub guest_count: i64,
    pub pricing: PricingSnapshot,
    pub cancellation_policy: CancellationPolicy,
    pub contract_preview_hash: String,
    pub requested_at: DateTime<Utc>,
}
