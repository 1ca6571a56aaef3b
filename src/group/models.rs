use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// A payer group sharing one virtual card. Owned by the surrounding CRUD
/// system; this service only reads it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub admin_id: Uuid,
}

/// A group member together with their own stored payment instrument,
/// if any. Instrument references point at the payment processor's vault;
/// raw card data never enters this service.
#[derive(Debug, Clone, FromRow)]
pub struct MemberAccount {
    pub user_id: Uuid,
    pub instrument_reference: Option<String>,
}
