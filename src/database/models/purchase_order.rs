use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::line_item::LineItem;

pub const PURCHASE_ORDER_STATUSES: &[&str] = &["draft", "issued", "received", "cancelled"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub number: String,
    pub serial: i64,
    pub supplier_name: String,
    pub supplier_address: Option<String>,
    pub line_items: Json<Vec<LineItem>>,
    pub total: Decimal,
    pub status: String,
    pub expected_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
