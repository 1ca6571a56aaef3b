pub mod http;

pub use http::HttpChargeProcessor;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ChargeError;

/// One charge request against one member's own payment instrument,
/// tagged for traceability and processor-side idempotency.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Amount in currency minor units
    pub amount: i64,
    pub currency: String,
    /// Processor vault reference for the member's instrument
    pub instrument_reference: String,
    /// Stable key derived from `(event_id, member_id)` so a retried
    /// request is not double-applied
    pub idempotency_key: String,
    pub event_id: String,
    pub member_id: Uuid,
}

/// Narrow interface to the payment processor. Orchestration logic depends
/// only on this trait, so it is testable with a fake implementation.
#[async_trait]
pub trait ChargeProcessor: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<(), ChargeError>;
}
