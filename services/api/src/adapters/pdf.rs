//! services/api/src/adapters/pdf.rs
//!
//! Renders a laid-out progress report into PDF bytes with `printpdf`.
//! The core crate decides positions and colours; this adapter only converts
//! its top-left millimetre coordinates into PDF space.

use lehrjournal_core::report::{self, DrawOp, ReportLayout};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};

use crate::error::ApiError;

fn pdf_error(e: printpdf::Error) -> ApiError {
    ApiError::Internal(format!("PDF rendering failed: {}", e))
}

fn fill(layer: &PdfLayerReference, color: report::Rgb) {
    let report::Rgb(r, g, b) = color;
    layer.set_fill_color(Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    )));
}

fn draw(layer: &PdfLayerReference, op: &DrawOp, regular: &IndirectFontRef, bold: &IndirectFontRef) {
    match op {
        DrawOp::Text {
            x,
            y,
            size,
            bold: is_bold,
            color,
            text,
        } => {
            fill(layer, *color);
            let font = if *is_bold { bold } else { regular };
            layer.use_text(
                text.as_str(),
                *size,
                Mm(*x),
                Mm(report::PAGE_HEIGHT - *y),
                font,
            );
        }
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill: color,
        } => {
            fill(layer, *color);
            // PDF rectangles are anchored at their lower-left corner.
            let bottom = report::PAGE_HEIGHT - (*y + *height);
            layer.add_rect(Rect::new(
                Mm(*x),
                Mm(bottom),
                Mm(*x + *width),
                Mm(bottom + *height),
            ));
        }
    }
}

/// Produces the bytes of a complete PDF document, one PDF page per layout page.
pub fn render_pdf(layout: &ReportLayout) -> Result<Vec<u8>, ApiError> {
    let width = Mm(report::PAGE_WIDTH);
    let height = Mm(report::PAGE_HEIGHT);
    let (doc, first_page, first_layer) =
        PdfDocument::new(layout.title.as_str(), width, height, "Inhalt");

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) = doc.add_page(width, height, "Inhalt");
            doc.get_page(page_ref).get_layer(layer_ref)
        };
        for op in &page.ops {
            draw(&layer, op, &regular, &bold);
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lehrjournal_core::report::{layout_report, ReportHeader};
    use lehrjournal_core::stats::{compute, TimeFilter};

    #[test]
    fn renders_a_pdf_document() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let stats = compute(&[], TimeFilter::All, today);
        let header = ReportHeader {
            apprentice_name: "Lea Muster".to_string(),
            company_name: Some("Holzbau AG".to_string()),
            trainer_name: None,
            generated_on: today,
        };
        let layout = layout_report(&header, &stats);

        let bytes = render_pdf(&layout).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }
}
