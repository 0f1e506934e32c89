use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::line_item::LineItem;

pub const PROPOSAL_STATUSES: &[&str] = &["draft", "sent", "accepted", "rejected"];

/// Quotation document; number is the generated `QT-NNNN`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Proposal {
    pub id: Uuid,
    pub number: String,
    pub serial: i64,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    pub line_items: Json<Vec<LineItem>>,
    pub discount_percent: Decimal,
    pub tax_percent: Decimal,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub status: String,
    pub valid_until: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
