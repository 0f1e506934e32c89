use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const VOUCHER_KINDS: &[&str] = &["payment", "receipt"];

/// Cash voucher; number is the generated `CV-NNNN`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CashVoucher {
    pub id: Uuid,
    pub number: String,
    pub serial: i64,
    pub payee: String,
    pub amount: Decimal,
    pub kind: String,
    pub description: Option<String>,
    pub voucher_date: NaiveDate,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
