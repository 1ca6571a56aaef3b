use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// One member's configured share of group spend, expressed 0-100.
/// Per group, active percentages sum to 100 within ±0.01.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MemberRatio {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub percentage: Decimal,
}
