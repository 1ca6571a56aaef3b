use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use super::{ChargeProcessor, ChargeRequest};
use crate::error::{AppError, AppResult, ChargeError};

/// Payment processor client over HTTP.
///
/// Sends `POST {base_url}/v1/charges` with bearer auth and the idempotency
/// key both in the body and as a header. The client carries its own
/// request timeout; the orchestrator additionally bounds each call.
pub struct HttpChargeProcessor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChargeBody<'a> {
    amount: i64,
    currency: &'a str,
    instrument: &'a str,
    idempotency_key: &'a str,
    metadata: ChargeMetadata<'a>,
}

#[derive(Serialize)]
struct ChargeMetadata<'a> {
    event_id: &'a str,
    member_id: Uuid,
}

#[derive(Deserialize)]
struct ChargeResponse {
    status: String,
    failure_reason: Option<String>,
}

impl HttpChargeProcessor {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl ChargeProcessor for HttpChargeProcessor {
    async fn charge(&self, request: &ChargeRequest) -> Result<(), ChargeError> {
        let body = ChargeBody {
            amount: request.amount,
            currency: &request.currency,
            instrument: &request.instrument_reference,
            idempotency_key: &request.idempotency_key,
            metadata: ChargeMetadata {
                event_id: &request.event_id,
                member_id: request.member_id,
            },
        };

        debug!(
            "Issuing charge of {} for member {} (key {})",
            request.amount, request.member_id, request.idempotency_key
        );

        let response = self
            .client
            .post(format!("{}/v1/charges", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Idempotency-Key", &request.idempotency_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChargeError::ProcessorCall(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(
                "Processor rejected charge for member {}: {}",
                request.member_id, status
            );
            return Err(ChargeError::ProcessorCall(format!(
                "Processor returned {}: {}",
                status, detail
            )));
        }

        let parsed: ChargeResponse = response
            .json()
            .await
            .map_err(|e| ChargeError::ProcessorCall(format!("Invalid processor response: {}", e)))?;

        if parsed.status != "succeeded" {
            let reason = parsed
                .failure_reason
                .unwrap_or_else(|| format!("status {}", parsed.status));
            return Err(ChargeError::ProcessorCall(reason));
        }

        Ok(())
    }
}
