//! Sequential document numbers.
//!
//! Serials are allocated with MAX+1 inside the caller's insert transaction;
//! the unique index on `serial`/`number` turns a concurrent allocation into a
//! unique violation (mapped to 409) instead of a silently duplicated number.

use sqlx::PgConnection;

/// Tables that carry a tenant-wide running serial
#[derive(Debug, Clone, Copy)]
pub enum SerialTable {
    Proposals,
    PurchaseOrders,
    CashVouchers,
}

pub async fn next_serial(conn: &mut PgConnection, table: SerialTable) -> Result<i64, sqlx::Error> {
    let sql = match table {
        SerialTable::Proposals => "SELECT COALESCE(MAX(serial), 0) + 1 FROM proposals",
        SerialTable::PurchaseOrders => "SELECT COALESCE(MAX(serial), 0) + 1 FROM purchase_orders",
        SerialTable::CashVouchers => "SELECT COALESCE(MAX(serial), 0) + 1 FROM cash_vouchers",
    };
    sqlx::query_scalar(sql).fetch_one(conn).await
}

/// Project serials restart every calendar month
pub async fn next_monthly_project_serial(conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(MAX(serial), 0) + 1 FROM projects
         WHERE date_trunc('month', created_at) = date_trunc('month', now())",
    )
    .fetch_one(conn)
    .await
}

pub fn voucher_number(serial: i64) -> String {
    format!("CV-{:04}", serial)
}

pub fn purchase_order_number(serial: i64) -> String {
    format!("PO-{:04}", serial)
}

pub fn proposal_number(serial: i64) -> String {
    format!("QT-{:04}", serial)
}

/// Project code `serial-month-year`, e.g. `012-08-2026`
pub fn project_code(serial: i64, month: u32, year: i32) -> String {
    format!("{:03}-{:02}-{:04}", serial, month, year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voucher_numbers_are_zero_padded() {
        assert_eq!(voucher_number(1), "CV-0001");
        assert_eq!(voucher_number(42), "CV-0042");
        assert_eq!(voucher_number(12345), "CV-12345");
    }

    #[test]
    fn document_number_prefixes() {
        assert_eq!(purchase_order_number(7), "PO-0007");
        assert_eq!(proposal_number(310), "QT-0310");
    }

    #[test]
    fn project_code_format() {
        assert_eq!(project_code(12, 8, 2026), "012-08-2026");
        assert_eq!(project_code(1, 1, 2025), "001-01-2025");
    }
}
