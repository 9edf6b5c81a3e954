use async_trait::async_trait;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::{
    domain::{Booking, NewBooking},
    error::Result,
};

/// Reference to a rendered contract document in object storage.
#[derive(Debug, Clone)]
pub struct ContractFile {
    pub key: String,
    pub url: String,
}

/// Renders and stores the executed rental contract after payment. Failure
/// here never blocks payment acceptance; callers log and move on.
#[async_trait]
pub trait ContractRenderer: Send + Sync {
    async fn render(&self, booking: &Booking) -> Result<ContractFile>;
}

/// Hash of the frozen contract terms, stamped on the booking at creation so
/// the parties can detect later drift between preview and execution.
pub fn preview_hash(booking: &NewBooking) -> String {
    let raw = json!({
        "listingId": booking.listing_id,
        "guestId": booking.guest_id,
        "hostId": booking.host_id,
        "checkin": booking.checkin_date,
        "checkout": booking.checkout_date,
        "pricing": booking.pricing,
    });
    let mut hasher = Sha256::new();
    hasher.update(raw.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// S3-addressed renderer. PDF generation proper is delegated to the document
/// pipeline; this computes the canonical object reference for the booking.
pub struct S3ContractRenderer {
    bucket: String,
    region: String,
}

impl S3ContractRenderer {
    pub fn new(bucket: String, region: String) -> Self {
        Self { bucket, region }
    }
}

#[async_trait]
impl ContractRenderer for S3ContractRenderer {
    async fn render(&self, booking: &Booking) -> Result<ContractFile> {
        let key = format!("contracts/{}.pdf", booking.id);
        let url = format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        );
        Ok(ContractFile { key, url })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub struct FailingContractRenderer;

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl ContractRenderer for FailingContractRenderer {
    async fn render(&self, _booking: &Booking) -> Result<ContractFile> {
        Err(crate::error::AppError::Internal(
            "contract pipeline offline".to_string(),
        ))
    }
}
