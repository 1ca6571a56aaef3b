use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::orchestrator::DisbursementDirectory;
use crate::error::AppResult;
use crate::group::{Group, GroupRepository, MemberAccount};
use crate::ratio::{MemberRatio, RatioResolver};

/// Postgres-backed directory, composing the group repository with the
/// ratio resolver so a first disbursement for a group sees the same
/// persisted equal split a later one does.
pub struct PgDisbursementDirectory {
    groups: Arc<GroupRepository>,
    ratios: Arc<RatioResolver>,
}

impl PgDisbursementDirectory {
    pub fn new(groups: Arc<GroupRepository>, ratios: Arc<RatioResolver>) -> Self {
        Self { groups, ratios }
    }
}

#[async_trait]
impl DisbursementDirectory for PgDisbursementDirectory {
    async fn group_for_card(&self, card_reference: &str) -> AppResult<Option<Group>> {
        self.groups.find_group_by_card(card_reference).await
    }

    async fn member_accounts(&self, group_id: Uuid) -> AppResult<Vec<MemberAccount>> {
        self.groups.member_accounts(group_id).await
    }

    async fn ratios_for_group(&self, group_id: Uuid) -> AppResult<Vec<MemberRatio>> {
        self.ratios.get_ratios(group_id).await
    }

    async fn was_event_processed(&self, event_id: &str) -> AppResult<bool> {
        self.groups.was_event_processed(event_id).await
    }

    async fn mark_event_processed(&self, event_id: &str) -> AppResult<()> {
        self.groups.mark_event_processed(event_id).await
    }
}
