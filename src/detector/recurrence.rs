use std::collections::HashMap;

use chrono::Duration;
use rust_decimal::Decimal;
use tracing::info;

use super::models::{SubscriptionCandidate, Transaction};

/// Consecutive occurrences must be between 25 and 35 days apart (inclusive)
/// to count as a monthly cadence.
const MIN_CADENCE_DAYS: i64 = 25;
const MAX_CADENCE_DAYS: i64 = 35;

/// Identify recurring monthly charges in a normalized transaction sequence
/// and predict the next occurrence of each.
///
/// Transactions are grouped by the exact `(description, amount)` pair. A
/// group qualifies only if it has at least two occurrences and every
/// consecutive gap falls within the cadence window; one gap outside the
/// window disqualifies the whole group. The next occurrence is estimated as
/// the last date plus the mean observed gap, truncated to whole days.
pub fn detect(transactions: &[Transaction]) -> Vec<SubscriptionCandidate> {
    let mut groups: HashMap<(String, Decimal), Vec<chrono::NaiveDate>> = HashMap::new();
    for txn in transactions {
        groups
            .entry((txn.description.clone(), txn.amount))
            .or_default()
            .push(txn.date);
    }

    let mut candidates: Vec<SubscriptionCandidate> = groups
        .into_iter()
        .filter_map(|((description, amount), mut dates)| {
            // A single occurrence cannot establish a cadence
            if dates.len() < 2 {
                return None;
            }
            dates.sort();

            let deltas: Vec<i64> = dates
                .windows(2)
                .map(|pair| pair[1].signed_duration_since(pair[0]).num_days())
                .collect();

            let is_monthly = deltas
                .iter()
                .all(|&days| (MIN_CADENCE_DAYS..=MAX_CADENCE_DAYS).contains(&days));
            if !is_monthly {
                return None;
            }

            // Mean gap, fractional days truncated
            let mean_gap = deltas.iter().sum::<i64>() / deltas.len() as i64;
            let last = *dates.last().expect("group has at least two dates");
            let estimated_next_date = last + Duration::days(mean_gap);

            Some(SubscriptionCandidate {
                description,
                amount,
                occurrence_dates: dates,
                estimated_next_date,
            })
        })
        .collect();

    // HashMap iteration order is arbitrary; fix the output order so repeated
    // runs over the same ledger agree
    candidates.sort_by(|a, b| {
        a.description
            .cmp(&b.description)
            .then(a.amount.cmp(&b.amount))
    });

    info!(
        "Detected {} recurring series from {} transactions",
        candidates.len(),
        transactions.len()
    );

    candidates
}
