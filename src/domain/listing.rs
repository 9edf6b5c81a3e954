use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::CancellationPolicy;

/// Listing lookup surface consumed by the booking engine. Listing CRUD and
/// moderation are external; bookings only ever read approved listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub status: ListingStatus,
    pub base_price: i64,
    pub cleaning_fee: i64,
    pub service_fee: i64,
    pub tax_pct: f64,
    pub cancellation_policy: CancellationPolicy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    PendingReview,
    Approved,
    Rejected,
    Delisted,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::PendingReview => "pending_review",
            ListingStatus::Approved => "approved",
            ListingStatus::Rejected => "rejected",
            ListingStatus::Delisted => "delisted",
        }
    }

    pub fn parse(s: &str) -> Option<ListingStatus> {
        match s {
            "pending_review" => Some(ListingStatus::PendingReview),
            "approved" => Some(ListingStatus::Approved),
            "rejected" => Some(ListingStatus::Rejected),
            "delisted" => Some(ListingStatus::Delisted),
            _ => None,
        }
    }
}

/// Percentage promo discount applied against the pricing subtotal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Uuid,
    pub code: String,
    pub discount_pct: f64,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}
