use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    clock::Clock,
    contracts::ContractRenderer,
    domain::BookingStatus,
    error::{AppError, Result},
    notifications::NotificationSink,
    payments::verify_signature,
    repository::{BookingRepository, PaymentReceipt},
};

/// Provider webhook envelope. `code == "00"` with `success` marks a
/// successful payment; everything else is a failure report. `data` carries
/// provider extras we keep only in the raw audit copy.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    pub code: String,
    #[serde(default)]
    pub desc: Option<String>,
    pub success: bool,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookData {
    /// The provider sends the order code as a JSON number; older payloads
    /// used a string. Both are accepted.
    #[serde(deserialize_with = "order_code_as_string")]
    pub order_code: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
}

fn order_code_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::String(s) => Ok(s),
        other => Err(serde::de::Error::custom(format!(
            "orderCode must be a number or string, got {other}"
        ))),
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookAck {
    fn ok() -> Self {
        Self { ok: true, message: None }
    }

    fn already_processed() -> Self {
        Self {
            ok: true,
            message: Some("Already processed".to_string()),
        }
    }

    fn recorded_for_review() -> Self {
        Self {
            ok: true,
            message: Some("Recorded for manual reconciliation".to_string()),
        }
    }
}

/// Applies provider payment notifications exactly once despite
/// at-least-once, possibly reordered delivery. Duplicates are detected by
/// the booking's terminal payment state; side effects (contract issuance,
/// notification) are best-effort and never roll back the transition.
pub struct PaymentReconciler {
    booking_repo: Arc<dyn BookingRepository>,
    contract_renderer: Arc<dyn ContractRenderer>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    checksum_key: String,
}

impl PaymentReconciler {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        contract_renderer: Arc<dyn ContractRenderer>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        checksum_key: String,
    ) -> Self {
        Self {
            booking_repo,
            contract_renderer,
            notifier,
            clock,
            checksum_key,
        }
    }

    /// `raw_body` must be the unmodified payload bytes; the signature is
    /// keyed over them, so any re-serialization breaks verification.
    pub async fn process(&self, raw_body: &[u8], signature: Option<&str>) -> Result<WebhookAck> {
        let signature = signature.ok_or(AppError::WebhookSignature)?;
        if !verify_signature(&self.checksum_key, raw_body, signature) {
            return Err(AppError::WebhookSignature);
        }

        let envelope: WebhookEnvelope = serde_json::from_slice(raw_body)
            .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {e}")))?;

        let booking = self
            .booking_repo
            .find_by_order_code(&envelope.data.order_code)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No booking for order code {}",
                    envelope.data.order_code
                ))
            })?;

        let succeeded = envelope.success && envelope.code == "00";

        if succeeded && booking.status == BookingStatus::Paid {
            tracing::info!(
                booking_id = %booking.id,
                order_code = %envelope.data.order_code,
                "duplicate success webhook, already paid"
            );
            return Ok(WebhookAck::already_processed());
        }

        if !succeeded {
            let changed = self
                .booking_repo
                .mark_payment_failed(booking.id, self.clock.now())
                .await?;
            tracing::warn!(
                booking_id = %booking.id,
                order_code = %envelope.data.order_code,
                code = %envelope.code,
                changed,
                "payment failure reported by provider"
            );
            return Ok(WebhookAck::ok());
        }

        let receipt = PaymentReceipt {
            provider_txn_id: envelope.data.reference.clone().unwrap_or_default(),
            // Audit the booking's own total; the provider amount is kept in
            // the raw copy for dispute handling.
            amount: booking.pricing.total,
            raw: String::from_utf8_lossy(raw_body).into_owned(),
            occurred_at: self.clock.now(),
        };

        let changed = self.booking_repo.mark_paid(booking.id, &receipt).await?;
        if changed == 0 {
            let current = self
                .booking_repo
                .find_by_id(booking.id)
                .await?
                .ok_or_else(|| AppError::NotFound("Booking vanished mid-webhook".to_string()))?;
            if current.status == BookingStatus::Paid {
                // A concurrent delivery won the transition; ours is a no-op.
                return Ok(WebhookAck::already_processed());
            }
            // Money arrived for a booking that left the payable states in
            // flight (e.g. the guest cancelled between initiation and bank
            // settlement). Keep the receipt so ops can reconcile it.
            self.booking_repo.record_receipt(booking.id, &receipt).await?;
            tracing::warn!(
                booking_id = %booking.id,
                order_code = %envelope.data.order_code,
                status = current.status.as_str(),
                reference = %receipt.provider_txn_id,
                amount = receipt.amount,
                "success webhook for a non-payable booking; receipt recorded for manual reconciliation"
            );
            return Ok(WebhookAck::recorded_for_review());
        }

        tracing::info!(
            booking_id = %booking.id,
            order_code = %envelope.data.order_code,
            amount = receipt.amount,
            "payment reconciled, booking paid"
        );

        self.issue_contract(booking.id).await;
        self.notifier
            .notify(
                booking.guest_id,
                "Payment received. Your booking is confirmed.",
                &format!("/my-bookings/{}", booking.id),
            )
            .await;

        Ok(WebhookAck::ok())
    }

    /// Contract issuance rides behind the payment transition; its failure is
    /// logged with full context and swallowed.
    async fn issue_contract(&self, booking_id: uuid::Uuid) {
        let booking = match self.booking_repo.find_by_id(booking_id).await {
            Ok(Some(b)) => b,
            Ok(None) => return,
            Err(e) => {
                tracing::error!(%booking_id, "contract issuance: reload failed: {e}");
                return;
            }
        };

        match self.contract_renderer.render(&booking).await {
            Ok(file) => {
                if let Err(e) = self
                    .booking_repo
                    .set_contract_executed(booking_id, self.clock.now(), &file.key, &file.url)
                    .await
                {
                    tracing::error!(%booking_id, "contract issuance: stamp failed: {e}");
                }
            }
            Err(e) => {
                tracing::error!(%booking_id, "contract issuance failed (payment unaffected): {e}");
            }
        }
    }
}
