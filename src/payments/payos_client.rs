use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    payments::{sign_payment_request, PaymentGateway, PaymentLink, PaymentLinkRequest},
};

/// PayOS payment-link API client. The provider identifies one intent by a
/// numeric order code and returns a hosted checkout URL plus VietQR data.
pub struct PayosClient {
    http: reqwest::Client,
    api_base: String,
    client_id: String,
    api_key: String,
    checksum_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateLinkBody<'a> {
    order_code: i64,
    amount: i64,
    description: &'a str,
    return_url: &'a str,
    cancel_url: &'a str,
    signature: String,
}

#[derive(Deserialize)]
struct CreateLinkResponse {
    code: String,
    desc: Option<String>,
    data: Option<CreateLinkData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLinkData {
    payment_link_id: Option<String>,
    checkout_url: Option<String>,
    qr_code: Option<String>,
}

impl PayosClient {
    pub fn new(
        api_base: String,
        client_id: String,
        api_key: String,
        checksum_key: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            client_id,
            api_key,
            checksum_key,
        }
    }

    pub fn checksum_key(&self) -> &str {
        &self.checksum_key
    }
}

#[async_trait]
impl PaymentGateway for PayosClient {
    async fn create_payment_link(&self, request: &PaymentLinkRequest) -> Result<PaymentLink> {
        let order_code: i64 = request
            .order_code
            .parse()
            .map_err(|_| AppError::Internal(format!("Non-numeric order code: {}", request.order_code)))?;

        let signature = sign_payment_request(
            &self.checksum_key,
            request.amount,
            &request.cancel_url,
            &request.description,
            &request.order_code,
            &request.return_url,
        );

        let body = CreateLinkBody {
            order_code,
            amount: request.amount,
            description: &request.description,
            return_url: &request.return_url,
            cancel_url: &request.cancel_url,
            signature,
        };

        let response = self
            .http
            .post(format!("{}/v2/payment-requests", self.api_base))
            .header("x-client-id", &self.client_id)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("PayOS request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Provider(format!(
                "PayOS returned HTTP {status}"
            )));
        }

        let parsed: CreateLinkResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("PayOS response unreadable: {e}")))?;

        if parsed.code != "00" {
            return Err(AppError::Provider(format!(
                "PayOS rejected payment link: {} ({})",
                parsed.code,
                parsed.desc.unwrap_or_default()
            )));
        }

        let data = parsed
            .data
            .ok_or_else(|| AppError::Provider("PayOS response missing data".to_string()))?;

        Ok(PaymentLink {
            // The provider may omit its own id; the order code stands in.
            intent_id: data
                .payment_link_id
                .unwrap_or_else(|| request.order_code.clone()),
            checkout_url: data.checkout_url.unwrap_or_default(),
            qr_data: data.qr_code.unwrap_or_default(),
        })
    }
}
