//! String-templated printable documents.
//!
//! Self-contained HTML with inline CSS, returned to the browser for
//! print-to-PDF. All row values pass through `html_escape` before insertion.

use html_escape::encode_text;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::database::models::cash_voucher::CashVoucher;
use crate::database::models::proposal::Proposal;

const DOC_STYLE: &str = r#"
body { font-family: Arial, Helvetica, sans-serif; margin: 40px; color: #222; }
h1 { font-size: 20px; letter-spacing: 2px; border-bottom: 2px solid #222; padding-bottom: 8px; }
table { width: 100%; border-collapse: collapse; margin-top: 16px; }
th, td { border: 1px solid #999; padding: 6px 10px; font-size: 13px; text-align: left; }
th { background: #f0f0f0; }
.meta { margin-top: 12px; font-size: 13px; }
.meta span { display: inline-block; min-width: 140px; font-weight: bold; }
.totals td { text-align: right; }
.signatures { margin-top: 60px; display: flex; justify-content: space-between; }
.signatures div { border-top: 1px solid #222; width: 200px; text-align: center; padding-top: 4px; font-size: 12px; }
.amount-words { margin-top: 16px; font-style: italic; font-size: 13px; }
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        encode_text(title),
        DOC_STYLE,
        body
    )
}

/// Printable cash voucher
pub fn voucher_html(voucher: &CashVoucher) -> String {
    let mut body = String::new();
    body.push_str("<h1>CASH VOUCHER</h1>\n");
    body.push_str(&format!(
        "<p class=\"meta\"><span>Voucher No:</span>{}</p>\n",
        encode_text(&voucher.number)
    ));
    body.push_str(&format!(
        "<p class=\"meta\"><span>Date:</span>{}</p>\n",
        voucher.voucher_date.format("%d %b %Y")
    ));
    body.push_str(&format!(
        "<p class=\"meta\"><span>Type:</span>{}</p>\n",
        encode_text(&voucher.kind)
    ));
    body.push_str(&format!(
        "<p class=\"meta\"><span>Paid to / Received from:</span>{}</p>\n",
        encode_text(&voucher.payee)
    ));
    if let Some(description) = &voucher.description {
        body.push_str(&format!(
            "<p class=\"meta\"><span>Being:</span>{}</p>\n",
            encode_text(description)
        ));
    }
    body.push_str(&format!(
        "<p class=\"meta\"><span>Amount:</span>{:.2}</p>\n",
        voucher.amount
    ));
    body.push_str(&format!(
        "<p class=\"amount-words\">Amount in words: {}</p>\n",
        encode_text(&amount_in_words(voucher.amount))
    ));
    body.push_str(
        "<div class=\"signatures\"><div>Prepared by</div><div>Approved by</div><div>Receiver</div></div>\n",
    );

    page(&format!("Cash Voucher {}", voucher.number), &body)
}

/// Printable quotation
pub fn quotation_html(proposal: &Proposal) -> String {
    let mut body = String::new();
    body.push_str("<h1>QUOTATION</h1>\n");
    body.push_str(&format!(
        "<p class=\"meta\"><span>Quotation No:</span>{}</p>\n",
        encode_text(&proposal.number)
    ));
    body.push_str(&format!(
        "<p class=\"meta\"><span>Date:</span>{}</p>\n",
        proposal.created_at.format("%d %b %Y")
    ));
    body.push_str(&format!(
        "<p class=\"meta\"><span>To:</span>{}</p>\n",
        encode_text(&proposal.client_name)
    ));
    if let Some(address) = &proposal.client_address {
        body.push_str(&format!(
            "<p class=\"meta\"><span>Address:</span>{}</p>\n",
            encode_text(address)
        ));
    }
    if let Some(valid_until) = &proposal.valid_until {
        body.push_str(&format!(
            "<p class=\"meta\"><span>Valid until:</span>{}</p>\n",
            valid_until.format("%d %b %Y")
        ));
    }

    body.push_str("<table>\n<tr><th>#</th><th>Description</th><th>Qty</th><th>Unit Price</th><th>Total</th></tr>\n");
    for (index, item) in proposal.line_items.0.iter().enumerate() {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
            index + 1,
            encode_text(&item.description),
            item.quantity,
            item.unit_price,
            item.line_total()
        ));
    }
    body.push_str(&format!(
        "<tr class=\"totals\"><td colspan=\"4\">Subtotal</td><td>{:.2}</td></tr>\n",
        proposal.subtotal
    ));
    if !proposal.discount_percent.is_zero() {
        body.push_str(&format!(
            "<tr class=\"totals\"><td colspan=\"4\">Discount</td><td>{}%</td></tr>\n",
            proposal.discount_percent
        ));
    }
    if !proposal.tax_percent.is_zero() {
        body.push_str(&format!(
            "<tr class=\"totals\"><td colspan=\"4\">Tax</td><td>{}%</td></tr>\n",
            proposal.tax_percent
        ));
    }
    body.push_str(&format!(
        "<tr class=\"totals\"><td colspan=\"4\"><b>Grand Total</b></td><td><b>{:.2}</b></td></tr>\n",
        proposal.total
    ));
    body.push_str("</table>\n");
    body.push_str(
        "<div class=\"signatures\"><div>Prepared by</div><div>Authorized signatory</div></div>\n",
    );

    page(&format!("Quotation {}", proposal.number), &body)
}

const ONES: [&str; 20] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

fn words_below_thousand(n: u64, out: &mut Vec<String>) {
    if n >= 100 {
        out.push(ONES[(n / 100) as usize].to_string());
        out.push("Hundred".to_string());
    }
    let rest = n % 100;
    if rest >= 20 {
        out.push(TENS[(rest / 10) as usize].to_string());
        if rest % 10 != 0 {
            out.push(ONES[(rest % 10) as usize].to_string());
        }
    } else if rest > 0 {
        out.push(ONES[rest as usize].to_string());
    }
}

/// Spell out the integer part of an amount, e.g. `8500` -> "Eight Thousand
/// Five Hundred Only". Fractional parts are dropped; the printed figure next
/// to it carries the cents.
pub fn amount_in_words(amount: Decimal) -> String {
    let n = amount.trunc().to_u64().unwrap_or(0);
    if n == 0 {
        return "Zero Only".to_string();
    }

    let mut parts = Vec::new();
    let billions = n / 1_000_000_000;
    let millions = (n / 1_000_000) % 1_000;
    let thousands = (n / 1_000) % 1_000;
    let rest = n % 1_000;

    if billions > 0 {
        words_below_thousand(billions, &mut parts);
        parts.push("Billion".to_string());
    }
    if millions > 0 {
        words_below_thousand(millions, &mut parts);
        parts.push("Million".to_string());
    }
    if thousands > 0 {
        words_below_thousand(thousands, &mut parts);
        parts.push("Thousand".to_string());
    }
    if rest > 0 {
        words_below_thousand(rest, &mut parts);
    }

    parts.push("Only".to_string());
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use sqlx::types::Json;
    use uuid::Uuid;

    use crate::database::models::line_item::LineItem;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sample_voucher() -> CashVoucher {
        CashVoucher {
            id: Uuid::new_v4(),
            number: "CV-0042".into(),
            serial: 42,
            payee: "Acme <Supplies>".into(),
            amount: d("8500.00"),
            kind: "payment".into(),
            description: Some("Office chairs".into()),
            voucher_date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn voucher_html_escapes_and_includes_number() {
        let html = voucher_html(&sample_voucher());
        assert!(html.contains("CV-0042"));
        assert!(html.contains("Acme &lt;Supplies&gt;"));
        assert!(!html.contains("Acme <Supplies>"));
        assert!(html.contains("Eight Thousand Five Hundred Only"));
    }

    #[test]
    fn quotation_html_renders_line_items_and_totals() {
        let proposal = Proposal {
            id: Uuid::new_v4(),
            number: "QT-0007".into(),
            serial: 7,
            client_name: "Globex".into(),
            client_email: None,
            client_address: None,
            line_items: Json(vec![LineItem {
                description: "Consulting".into(),
                quantity: d("10"),
                unit_price: d("120.00"),
            }]),
            discount_percent: d("0"),
            tax_percent: d("18"),
            subtotal: d("1200.00"),
            total: d("1416.00"),
            status: "draft".into(),
            valid_until: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let html = quotation_html(&proposal);
        assert!(html.contains("QT-0007"));
        assert!(html.contains("Consulting"));
        assert!(html.contains("1416.00"));
        assert!(html.contains("Tax"));
    }

    #[test]
    fn amounts_in_words() {
        assert_eq!(amount_in_words(d("0")), "Zero Only");
        assert_eq!(amount_in_words(d("7")), "Seven Only");
        assert_eq!(amount_in_words(d("19")), "Nineteen Only");
        assert_eq!(amount_in_words(d("42")), "Forty Two Only");
        assert_eq!(amount_in_words(d("100")), "One Hundred Only");
        assert_eq!(amount_in_words(d("8500.75")), "Eight Thousand Five Hundred Only");
        assert_eq!(
            amount_in_words(d("1234567")),
            "One Million Two Hundred Thirty Four Thousand Five Hundred Sixty Seven Only"
        );
    }
}
