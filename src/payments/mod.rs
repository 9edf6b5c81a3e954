pub mod payos_client;
pub mod reconciler;

pub use payos_client::PayosClient;
pub use reconciler::PaymentReconciler;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::Result;

type HmacSha256 = Hmac<Sha256>;

/// Verifies the provider's keyed signature over the raw, unmodified payload
/// bytes. Hex-encoded HMAC-SHA256, compared in constant time. No field of
/// the payload may be trusted before this passes.
pub fn verify_signature(checksum_key: &str, raw_body: &[u8], signature_hex: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(checksum_key.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    let computed = hex::encode(mac.finalize().into_bytes());
    computed.as_bytes().ct_eq(signature_hex.as_bytes()).into()
}

/// Signs an outbound payment-link request the way PayOS expects: HMAC over
/// the alphabetically-ordered query-string rendering of the core fields.
pub fn sign_payment_request(
    checksum_key: &str,
    amount: i64,
    cancel_url: &str,
    description: &str,
    order_code: &str,
    return_url: &str,
) -> String {
    let data = format!(
        "amount={amount}&cancelUrl={cancel_url}&description={description}&orderCode={order_code}&returnUrl={return_url}"
    );
    let mut mac = HmacSha256::new_from_slice(checksum_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[derive(Debug, Clone)]
pub struct PaymentLinkRequest {
    pub order_code: String,
    pub amount: i64,
    pub description: String,
    pub return_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct PaymentLink {
    pub intent_id: String,
    pub checkout_url: String,
    pub qr_data: String,
}

/// Outbound side of the payment provider: creating a hosted checkout link
/// for one payment intent. The inbound side (webhooks) goes through
/// [`PaymentReconciler`].
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_link(&self, request: &PaymentLinkRequest) -> Result<PaymentLink>;
}

#[cfg(any(test, feature = "test-utils"))]
pub use fake_gateway::FakePaymentGateway;

#[cfg(any(test, feature = "test-utils"))]
mod fake_gateway {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{PaymentGateway, PaymentLink, PaymentLinkRequest};
    use crate::error::{AppError, Result};

    /// In-process gateway for tests: hands out deterministic checkout links
    /// and records every request it sees.
    #[derive(Default)]
    pub struct FakePaymentGateway {
        pub fail: bool,
        pub requests: Mutex<Vec<PaymentLinkRequest>>,
    }

    impl FakePaymentGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for FakePaymentGateway {
        async fn create_payment_link(
            &self,
            request: &PaymentLinkRequest,
        ) -> Result<PaymentLink> {
            if self.fail {
                return Err(AppError::Provider("gateway unavailable".to_string()));
            }
            self.requests
                .lock()
                .expect("gateway mutex poisoned")
                .push(request.clone());
            Ok(PaymentLink {
                intent_id: format!("fake-intent-{}", request.order_code),
                checkout_url: format!("https://pay.example.test/{}", request.order_code),
                qr_data: format!("FAKEQR|{}|{}", request.order_code, request.amount),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_roundtrip() {
        let key = "test-checksum-key";
        let body = br#"{"code":"00","success":true}"#;
        let sig = {
            let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("valid key");
            mac.update(body);
            hex::encode(mac.finalize().into_bytes())
        };

        assert!(verify_signature(key, body, &sig));
        assert!(!verify_signature(key, body, "deadbeef"));
        assert!(!verify_signature(key, br#"{"tampered":true}"#, &sig));
    }

    #[test]
    fn request_signature_is_deterministic() {
        let a = sign_payment_request("k", 1000, "https://c", "desc", "123", "https://r");
        let b = sign_payment_request("k", 1000, "https://c", "desc", "123", "https://r");
        assert_eq!(a, b);
        let c = sign_payment_request("k", 1001, "https://c", "desc", "123", "https://r");
        assert_ne!(a, c);
    }
}
