use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line on a proposal or purchase order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// Sum of line totals, rounded to currency precision
pub fn subtotal(items: &[LineItem]) -> Decimal {
    items
        .iter()
        .map(LineItem::line_total)
        .sum::<Decimal>()
        .round_dp(2)
}

/// Apply discount then tax to a subtotal
pub fn grand_total(subtotal: Decimal, discount_percent: Decimal, tax_percent: Decimal) -> Decimal {
    let hundred = Decimal::from(100);
    let discounted = subtotal * (hundred - discount_percent) / hundred;
    let taxed = discounted * (hundred + tax_percent) / hundred;
    taxed.round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let items = vec![
            LineItem { description: "Design".into(), quantity: d("2"), unit_price: d("150.00") },
            LineItem { description: "Hosting".into(), quantity: d("1"), unit_price: d("49.99") },
        ];
        assert_eq!(subtotal(&items), d("349.99"));
    }

    #[test]
    fn grand_total_applies_discount_then_tax() {
        // 1000 - 10% = 900, + 18% tax = 1062.00
        let total = grand_total(d("1000"), d("10"), d("18"));
        assert_eq!(total, d("1062.00"));
    }

    #[test]
    fn grand_total_with_no_adjustments_is_identity() {
        assert_eq!(grand_total(d("250.50"), d("0"), d("0")), d("250.50"));
    }
}
