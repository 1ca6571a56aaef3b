use serde::Serialize;
use uuid::Uuid;

/// A verified card-spend signal from the event source. One orchestration
/// run processes exactly one of these.
#[derive(Debug, Clone)]
pub struct AuthorizationEvent {
    pub event_id: String,
    pub card_reference: String,
    /// Realized amount in currency minor units
    pub amount: i64,
    pub currency: String,
}

/// Outcome of one member's charge within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChargeOutcome {
    Succeeded,
    Failed { reason: String },
}

/// One charge attempt against one member's own payment instrument.
/// Transient: reported and logged, not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeAttempt {
    pub member_id: Uuid,
    pub amount: i64,
    pub outcome: ChargeOutcome,
}

impl ChargeAttempt {
    pub fn succeeded(&self) -> bool {
        self.outcome == ChargeOutcome::Succeeded
    }
}

/// Terminal status of a disbursement run. Rejections (bad signature,
/// unmapped card, no eligible payer) surface as errors before any charge is
/// issued and never reach this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisbursementStatus {
    /// Every member charge succeeded
    Completed,
    /// At least one charge succeeded and at least one failed. The event is
    /// still acknowledged: a retry would re-charge the members that
    /// already paid.
    PartiallyFailed,
    /// Every charge failed; no money moved
    Failed,
    /// Event id was already processed by an earlier run; nothing attempted
    AlreadyProcessed,
}

/// Aggregated result of one orchestration run
#[derive(Debug, Clone, Serialize)]
pub struct DisbursementReport {
    pub event_id: String,
    pub status: DisbursementStatus,
    pub attempts: Vec<ChargeAttempt>,
}

impl DisbursementReport {
    pub fn charged_member_count(&self) -> usize {
        self.attempts.iter().filter(|a| a.succeeded()).count()
    }
}
