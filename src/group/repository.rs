use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Group, MemberAccount};
use crate::error::AppResult;

/// Read-only view over group, membership, card-mapping and
/// payment-instrument records, plus the processed-event marks that make
/// event handling functionally-once.
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ========== GROUP LOOKUPS ==========

    pub async fn get_group(&self, group_id: Uuid) -> AppResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, name, admin_id
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Map a shared virtual card reference to its owning group
    pub async fn find_group_by_card(&self, card_reference: &str) -> AppResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            SELECT g.id, g.name, g.admin_id
            FROM groups g
            JOIN virtual_cards vc ON vc.group_id = g.id
            WHERE vc.card_reference = $1
            "#,
        )
        .bind(card_reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    // ========== MEMBERSHIP ==========

    /// Current member ids: accepted invitations plus the admin, who is
    /// always implicitly a member. Ascending order.
    pub async fn member_ids(&self, group_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT invitee_id AS user_id
            FROM group_invitations
            WHERE group_id = $1 AND accepted = TRUE
            UNION
            SELECT admin_id FROM groups WHERE id = $1
            ORDER BY user_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Members with their stored payment instruments, ascending user id
    pub async fn member_accounts(&self, group_id: Uuid) -> AppResult<Vec<MemberAccount>> {
        let accounts = sqlx::query_as::<_, MemberAccount>(
            r#"
            SELECT m.user_id, pi.instrument_reference
            FROM (
                SELECT invitee_id AS user_id
                FROM group_invitations
                WHERE group_id = $1 AND accepted = TRUE
                UNION
                SELECT admin_id FROM groups WHERE id = $1
            ) m
            LEFT JOIN payment_instruments pi ON pi.user_id = m.user_id
            ORDER BY m.user_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    pub async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let ids = self.member_ids(group_id).await?;
        Ok(ids.contains(&user_id))
    }

    // ========== PROCESSED EVENTS ==========

    pub async fn was_event_processed(&self, event_id: &str) -> AppResult<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM processed_events WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(found > 0)
    }

    pub async fn mark_event_processed(&self, event_id: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO processed_events (event_id, processed_at)
            VALUES ($1, NOW())
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
