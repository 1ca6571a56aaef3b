use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::MemberRatio;
use crate::error::AppResult;

/// Persistence for per-member payment-share configuration
pub struct RatioRepository {
    pool: PgPool,
}

impl RatioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active ratios for a group, ascending user id
    pub async fn list_for_group(&self, group_id: Uuid) -> AppResult<Vec<MemberRatio>> {
        let ratios = sqlx::query_as::<_, MemberRatio>(
            r#"
            SELECT group_id, user_id, percentage
            FROM group_member_ratios
            WHERE group_id = $1
            ORDER BY user_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratios)
    }

    /// Atomically replace the group's ratio set: old rows deleted and new
    /// rows inserted in one transaction, so no partial set is ever visible.
    pub async fn replace_for_group(
        &self,
        group_id: Uuid,
        entries: &[(Uuid, Decimal)],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM group_member_ratios WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .execute(&mut *tx)
        .await?;

        for (user_id, percentage) in entries {
            sqlx::query(
                r#"
                INSERT INTO group_member_ratios (group_id, user_id, percentage)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(group_id)
            .bind(user_id)
            .bind(percentage)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
