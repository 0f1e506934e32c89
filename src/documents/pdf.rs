//! Declarative PDF layout for printable vouchers.

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::database::models::cash_voucher::CashVoucher;

use super::html::amount_in_words;

// A5 landscape
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 148.0;

/// Render a cash voucher as PDF bytes
pub fn voucher_pdf(voucher: &CashVoucher) -> Result<Vec<u8>, printpdf::Error> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Cash Voucher {}", voucher.number),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "voucher",
    );

    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let layer = doc.get_page(page).get_layer(layer);

    layer.use_text("CASH VOUCHER", 18.0, Mm(20.0), Mm(128.0), &bold);
    layer.use_text(
        format!("No: {}", voucher.number),
        12.0,
        Mm(20.0),
        Mm(114.0),
        &bold,
    );
    layer.use_text(
        format!("Date: {}", voucher.voucher_date.format("%d %b %Y")),
        12.0,
        Mm(140.0),
        Mm(114.0),
        &regular,
    );
    layer.use_text(
        format!("Type: {}", voucher.kind),
        11.0,
        Mm(20.0),
        Mm(104.0),
        &regular,
    );
    layer.use_text(
        format!("Paid to / Received from: {}", voucher.payee),
        11.0,
        Mm(20.0),
        Mm(94.0),
        &regular,
    );
    if let Some(description) = &voucher.description {
        layer.use_text(
            format!("Being: {}", description),
            11.0,
            Mm(20.0),
            Mm(84.0),
            &regular,
        );
    }
    layer.use_text(
        format!("Amount: {:.2}", voucher.amount),
        13.0,
        Mm(20.0),
        Mm(72.0),
        &bold,
    );
    layer.use_text(
        format!("In words: {}", amount_in_words(voucher.amount)),
        10.0,
        Mm(20.0),
        Mm(62.0),
        &regular,
    );

    layer.use_text("Prepared by", 10.0, Mm(20.0), Mm(25.0), &regular);
    layer.use_text("Approved by", 10.0, Mm(90.0), Mm(25.0), &regular);
    layer.use_text("Receiver", 10.0, Mm(160.0), Mm(25.0), &regular);

    doc.save_to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    #[test]
    fn renders_nonempty_pdf() {
        let voucher = CashVoucher {
            id: Uuid::new_v4(),
            number: "CV-0001".into(),
            serial: 1,
            payee: "Acme Supplies".into(),
            amount: "1250.00".parse().unwrap(),
            kind: "payment".into(),
            description: None,
            voucher_date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let bytes = voucher_pdf(&voucher).expect("pdf bytes");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }
}
