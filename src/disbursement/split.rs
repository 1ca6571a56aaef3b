use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Where the accumulated floor-truncation remainder goes.
///
/// This is a policy choice, not an invariant: earlier iterations of the
/// split logic disagreed on first-vs-last, so the assignment is explicit
/// and configurable. `Last` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemainderPolicy {
    #[default]
    Last,
    First,
}

/// One member's computed share of an event amount, in minor units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberShare {
    pub user_id: Uuid,
    pub amount: i64,
}

/// Split an event amount across members by percentage.
///
/// Each share is `floor(amount * percentage / 100)`; the whole accumulated
/// remainder is assigned to one member per `policy`. The caller supplies
/// `ratios` in a fixed deterministic order (ascending member id), which
/// makes repeated runs over the same input reproducible and guarantees
/// `sum(shares) == amount` exactly.
pub fn compute_shares(
    amount: i64,
    ratios: &[(Uuid, Decimal)],
    policy: RemainderPolicy,
) -> Vec<MemberShare> {
    if ratios.is_empty() {
        return Vec::new();
    }

    let hundred = Decimal::from(100);
    let mut shares: Vec<MemberShare> = ratios
        .iter()
        .map(|(user_id, percentage)| {
            let exact = Decimal::from(amount) * percentage / hundred;
            let floored = exact.floor().to_i64().unwrap_or(0);
            MemberShare {
                user_id: *user_id,
                amount: floored,
            }
        })
        .collect();

    let remainder = amount - shares.iter().map(|s| s.amount).sum::<i64>();
    let target = match policy {
        RemainderPolicy::Last => shares.len() - 1,
        RemainderPolicy::First => 0,
    };
    shares[target].amount += remainder;

    shares
}
