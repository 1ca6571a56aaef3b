use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A normalized ledger transaction. Immutable once produced by the
/// normalizer; amounts are positive outflows in currency minor-unit
/// precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// A group of same-description, same-amount transactions recurring on an
/// approximately monthly cadence, with a predicted next occurrence.
///
/// Recomputed wholesale on each detection run; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionCandidate {
    pub description: String,
    pub amount: Decimal,
    /// Ascending, always at least two entries
    pub occurrence_dates: Vec<NaiveDate>,
    pub estimated_next_date: NaiveDate,
}
