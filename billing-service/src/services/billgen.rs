//! Bill document rendering. The download endpoint depends only on the
//! `BillGenerator` trait; the shipped implementation lays out a one-page
//! PDF with printpdf's built-in Helvetica faces.

use crate::models::Bill;
use chrono::FixedOffset;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use service_core::error::AppError;

pub trait BillGenerator: Send + Sync {
    /// Render a bill into a downloadable document, returned as raw bytes.
    fn render(&self, bill: &Bill) -> Result<Vec<u8>, AppError>;
}

pub struct PdfBillGenerator {
    timezone: FixedOffset,
}

impl PdfBillGenerator {
    pub fn new(timezone: FixedOffset) -> Self {
        Self { timezone }
    }
}

fn text_line(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    font_size: f32,
    x: f32,
    y: f32,
) {
    layer.use_text(text, font_size, Mm(x), Mm(y), font);
}

fn divider(layer: &PdfLayerReference, y: f32) {
    layer.add_line(printpdf::Line {
        points: vec![
            (printpdf::Point::new(Mm(15.0), Mm(y)), false),
            (printpdf::Point::new(Mm(195.0), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

impl BillGenerator for PdfBillGenerator {
    fn render(&self, bill: &Bill) -> Result<Vec<u8>, AppError> {
        let (doc, page, layer) = PdfDocument::new("Bill", Mm(210.0), Mm(297.0), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::RenderingFailure(anyhow::anyhow!(e)))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AppError::RenderingFailure(anyhow::anyhow!(e)))?;

        let date = bill
            .created_at
            .with_timezone(&self.timezone)
            .format("%d/%m/%Y")
            .to_string();

        // Header
        text_line(&layer, &font_bold, "TREE SALE BILL", 20.0, 15.0, 280.0);
        text_line(&layer, &font, &format!("Bill no: {}", bill.bill_id), 10.0, 15.0, 271.0);
        text_line(&layer, &font, &format!("Date: {date}"), 10.0, 145.0, 271.0);
        divider(&layer, 266.0);

        // Customer block
        let mut y = 256.0;
        text_line(&layer, &font_bold, "Customer", 12.0, 15.0, y);
        y -= 7.0;
        text_line(&layer, &font, &format!("ID: {}", bill.customer_id), 10.0, 15.0, y);
        y -= 5.0;
        text_line(&layer, &font, &format!("Name: {}", bill.customer_name), 10.0, 15.0, y);
        if let Some(phone) = &bill.phone {
            y -= 5.0;
            text_line(&layer, &font, &format!("Phone: {phone}"), 10.0, 15.0, y);
        }

        // Sale block
        y -= 12.0;
        text_line(&layer, &font_bold, "Sale", 12.0, 15.0, y);
        y -= 7.0;
        text_line(&layer, &font, &format!("Tree ID: {}", bill.tree_id), 10.0, 15.0, y);
        text_line(
            &layer,
            &font,
            &format!("Measurement: {}", bill.tree_measurement),
            10.0,
            80.0,
            y,
        );
        text_line(
            &layer,
            &font,
            &format!("Quantity: {}", bill.tree_quantity),
            10.0,
            150.0,
            y,
        );

        // Amounts
        y -= 12.0;
        divider(&layer, y + 4.0);
        text_line(&layer, &font, "Total amount:", 11.0, 120.0, y);
        text_line(&layer, &font_bold, &money(bill.total_amount), 11.0, 170.0, y);
        y -= 7.0;
        text_line(&layer, &font, "Amount paid:", 11.0, 120.0, y);
        text_line(&layer, &font_bold, &money(bill.amount_paid), 11.0, 170.0, y);
        y -= 7.0;
        text_line(&layer, &font, "Balance:", 11.0, 120.0, y);
        text_line(&layer, &font_bold, &money(bill.balance), 11.0, 170.0, y);

        let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
        doc.save(&mut writer)
            .map_err(|e| AppError::RenderingFailure(anyhow::anyhow!(e)))?;
        writer
            .into_inner()
            .map_err(|e| AppError::RenderingFailure(anyhow::anyhow!(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillInput;

    #[test]
    fn renders_a_pdf_document() {
        let bill = Bill::new(BillInput {
            customer_id: "C100".to_string(),
            customer_name: "Asha".to_string(),
            phone: Some("9000000000".to_string()),
            tree_id: "T-17".to_string(),
            tree_measurement: "12ft".to_string(),
            tree_quantity: 1,
            total_amount: 1500.0,
            amount_paid: 500.0,
        });

        let generator = PdfBillGenerator::new(
            crate::services::analytics::parse_utc_offset("+05:30").unwrap(),
        );
        let bytes = generator.render(&bill).expect("render should succeed");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
