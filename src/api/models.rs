use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::detector::normalizer::LedgerRow;
use crate::detector::SubscriptionCandidate;
use crate::ratio::MemberRatio;

// ========== REQUEST MODELS ==========

/// One member's share entry in a ratio replacement
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RatioEntry {
    pub user_id: Uuid,
    /// Share of group spend, 0-100
    pub percentage: Decimal,
}

/// Full replacement of a group's payment ratios. Admin-only; validated
/// atomically before anything is written.
#[derive(Debug, Deserialize, Validate)]
pub struct SetRatiosRequest {
    /// The caller; credential issuance lives in the surrounding system,
    /// which forwards the authenticated user id
    pub actor_id: Uuid,
    #[validate(length(min = 1, message = "at least one ratio entry is required"))]
    pub ratios: Vec<RatioEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RatiosQuery {
    pub actor_id: Uuid,
}

/// Normalized ledger rows for a detection run
#[derive(Debug, Deserialize, Validate)]
pub struct DetectRequest {
    #[validate(length(max = 100_000, message = "too many rows"))]
    pub rows: Vec<LedgerRow>,
}

// ========== RESPONSE MODELS ==========

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GroupRatiosResponse {
    pub group_id: Uuid,
    pub ratios: Vec<RatioEntry>,
}

impl GroupRatiosResponse {
    pub fn from_ratios(group_id: Uuid, ratios: Vec<MemberRatio>) -> Self {
        Self {
            group_id,
            ratios: ratios
                .into_iter()
                .map(|r| RatioEntry {
                    user_id: r.user_id,
                    percentage: r.percentage,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SetRatiosResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub subscriptions: Vec<SubscriptionCandidate>,
}

/// Synchronous answer for authorization-request events
#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub approved: bool,
}

/// Acknowledgement for processed (or deliberately ignored) events
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

impl WebhookAck {
    pub fn success() -> Self {
        Self { status: "success" }
    }
}
