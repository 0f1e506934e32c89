use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const HOLIDAY_KINDS: &[&str] = &["public", "company", "optional"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Holiday {
    pub id: Uuid,
    pub name: String,
    pub holiday_date: NaiveDate,
    pub kind: String,
    pub is_optional: bool,
    pub created_at: DateTime<Utc>,
}
