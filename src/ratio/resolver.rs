use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;
use uuid::Uuid;

use super::models::MemberRatio;
use super::repository::RatioRepository;
use crate::error::{AppError, AppResult, RatioError};
use crate::group::GroupRepository;

/// Percentage sums may drift from 100 by at most this much
const SUM_TOLERANCE: Decimal = dec!(0.01);

/// Maintains and validates per-member payment-share configuration.
pub struct RatioResolver {
    groups: Arc<GroupRepository>,
    ratios: Arc<RatioRepository>,
}

impl RatioResolver {
    pub fn new(groups: Arc<GroupRepository>, ratios: Arc<RatioRepository>) -> Self {
        Self { groups, ratios }
    }

    /// Current ratios for a group. When none have ever been set, an equal
    /// split across current members is computed and persisted before
    /// returning, so a later disbursement run observes the same
    /// percentages. A failed persist fails the read.
    pub async fn get_ratios(&self, group_id: Uuid) -> AppResult<Vec<MemberRatio>> {
        let existing = self.ratios.list_for_group(group_id).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let members = self.groups.member_ids(group_id).await?;
        if members.is_empty() {
            return Err(RatioError::EmptyGroup.into());
        }

        let entries = equal_split(&members);
        self.ratios
            .replace_for_group(group_id, &entries)
            .await
            .map_err(|e| {
                AppError::Persistence(format!("Failed to save default ratios: {}", e))
            })?;

        info!(
            "Persisted default equal split for group {} across {} members",
            group_id,
            members.len()
        );
        self.ratios.list_for_group(group_id).await
    }

    /// Replace the group's ratio set. Admin-only; every supplied user must
    /// currently be a member; percentages must sum to 100 within tolerance.
    /// Validation happens before any state change.
    pub async fn set_ratios(
        &self,
        group_id: Uuid,
        actor_id: Uuid,
        entries: &[(Uuid, Decimal)],
    ) -> AppResult<()> {
        let group = self
            .groups
            .get_group(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))?;

        if group.admin_id != actor_id {
            return Err(RatioError::NotAdmin.into());
        }

        let members: HashSet<Uuid> = self.groups.member_ids(group_id).await?.into_iter().collect();
        validate_entries(&members, entries)?;

        self.ratios.replace_for_group(group_id, entries).await?;
        info!(
            "Replaced payment ratios for group {} ({} entries)",
            group_id,
            entries.len()
        );
        Ok(())
    }
}

/// Equal split across members, the default when no ratios are configured
fn equal_split(members: &[Uuid]) -> Vec<(Uuid, Decimal)> {
    let share = (Decimal::from(100) / Decimal::from(members.len() as i64)).round_dp(4);
    members.iter().map(|id| (*id, share)).collect()
}

/// Pure validation of a replacement ratio set against the current member
/// set: range, membership, and total within `100 ± 0.01`.
fn validate_entries(members: &HashSet<Uuid>, entries: &[(Uuid, Decimal)]) -> Result<(), RatioError> {
    let hundred = Decimal::from(100);

    for (user_id, percentage) in entries {
        if *percentage < Decimal::ZERO || *percentage > hundred {
            return Err(RatioError::OutOfRange {
                user_id: *user_id,
                percentage: percentage.to_string(),
            });
        }
        if !members.contains(user_id) {
            return Err(RatioError::NotAMember(*user_id));
        }
    }

    let total: Decimal = entries.iter().map(|(_, p)| *p).sum();
    if (total - hundred).abs() > SUM_TOLERANCE {
        return Err(RatioError::InvalidTotal(total.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_set(n: u128) -> HashSet<Uuid> {
        (1..=n).map(Uuid::from_u128).collect()
    }

    #[test]
    fn accepts_an_exact_hundred() {
        let members = member_set(3);
        let entries = vec![
            (Uuid::from_u128(1), dec!(50)),
            (Uuid::from_u128(2), dec!(30)),
            (Uuid::from_u128(3), dec!(20)),
        ];
        assert!(validate_entries(&members, &entries).is_ok());
    }

    #[test]
    fn rejects_a_short_total() {
        let members = member_set(2);
        let entries = vec![
            (Uuid::from_u128(1), dec!(49.5)),
            (Uuid::from_u128(2), dec!(50)),
        ];
        assert!(matches!(
            validate_entries(&members, &entries),
            Err(RatioError::InvalidTotal(_))
        ));
    }

    #[test]
    fn accepts_a_total_within_tolerance() {
        let members = member_set(2);
        let entries = vec![
            (Uuid::from_u128(1), dec!(50.01)),
            (Uuid::from_u128(2), dec!(50)),
        ];
        assert!(validate_entries(&members, &entries).is_ok());
    }

    #[test]
    fn rejects_a_total_just_outside_tolerance() {
        let members = member_set(2);
        let entries = vec![
            (Uuid::from_u128(1), dec!(50.02)),
            (Uuid::from_u128(2), dec!(50)),
        ];
        assert!(matches!(
            validate_entries(&members, &entries),
            Err(RatioError::InvalidTotal(_))
        ));
    }

    #[test]
    fn rejects_and_names_a_non_member() {
        let members = member_set(2);
        let stranger = Uuid::from_u128(99);
        let entries = vec![
            (Uuid::from_u128(1), dec!(50)),
            (stranger, dec!(50)),
        ];
        assert!(matches!(
            validate_entries(&members, &entries),
            Err(RatioError::NotAMember(id)) if id == stranger
        ));
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        let members = member_set(2);
        let entries = vec![
            (Uuid::from_u128(1), dec!(-1)),
            (Uuid::from_u128(2), dec!(101)),
        ];
        assert!(matches!(
            validate_entries(&members, &entries),
            Err(RatioError::OutOfRange { .. })
        ));
    }

    #[test]
    fn equal_split_stays_within_tolerance() {
        for n in [1u128, 2, 3, 6, 7] {
            let members: Vec<Uuid> = (1..=n).map(Uuid::from_u128).collect();
            let entries = equal_split(&members);
            let total: Decimal = entries.iter().map(|(_, p)| *p).sum();
            assert!(
                (total - Decimal::from(100)).abs() <= SUM_TOLERANCE,
                "{} members sum to {}",
                n,
                total
            );
        }
    }
}
