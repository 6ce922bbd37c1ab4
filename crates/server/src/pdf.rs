//! A4 rendering of an [`ExportReport`].
//!
//! Layout: title, period, a summary block, then one table per record kind.
//! Rows flow onto new pages when the current one is full.

use engine::{ExportReport, MoneyCents, Record};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LINE: f32 = 6.0;
const DESCRIPTION_CHARS: usize = 40;

/// Left edge of each table column: date, category, amount, description.
const COLUMNS: [f32; 4] = [MARGIN, 50.0, 95.0, 130.0];

struct Writer {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl Writer {
    fn new(title: &str) -> Result<Self, printpdf::Error> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    /// Start a new page unless `height` more millimetres still fit.
    fn reserve(&mut self, height: f32) {
        if self.y - height >= MARGIN {
            return;
        }
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        self.reserve(LINE);
        self.text(text, size, MARGIN, bold);
        self.y -= LINE;
    }

    fn gap(&mut self) {
        self.y -= LINE;
    }

    fn row(&mut self, cells: [&str; 4], bold: bool) {
        self.reserve(LINE);
        for (cell, x) in cells.into_iter().zip(COLUMNS) {
            self.text(cell, 10.0, x, bold);
        }
        self.y -= LINE;
    }

    fn finish(self) -> Result<Vec<u8>, printpdf::Error> {
        self.doc.save_to_bytes()
    }
}

fn amount(value: MoneyCents, currency: &str) -> String {
    format!("{currency} {value}")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

fn records_table(writer: &mut Writer, heading: &str, records: &[Record], currency: &str) {
    writer.line(heading, 14.0, true);
    if records.is_empty() {
        writer.line("No records in this period.", 10.0, false);
        return;
    }

    // Keep the header row on the same page as the first record.
    writer.reserve(LINE * 2.0);
    writer.row(["Date", "Category", "Amount", "Description"], true);
    for record in records {
        let date = record.date.to_string();
        let value = amount(record.amount, currency);
        let description = truncate(
            record.description.as_deref().unwrap_or_default(),
            DESCRIPTION_CHARS,
        );
        writer.row(
            [&date, &record.category_name, &value, &description],
            false,
        );
    }
}

/// Render the report to PDF bytes.
pub fn render(report: &ExportReport) -> Result<Vec<u8>, printpdf::Error> {
    let currency = report.user.currency.as_str();
    let mut writer = Writer::new("Income & Expense Report")?;

    writer.line("Income & Expense Report", 18.0, true);
    writer.line(
        &format!("Period: {} to {}", report.start, report.end),
        11.0,
        false,
    );
    writer.gap();

    writer.line("Summary", 14.0, true);
    writer.line(
        &format!("Total Income: {}", amount(report.total_income, currency)),
        11.0,
        false,
    );
    writer.line(
        &format!("Total Expense: {}", amount(report.total_expense, currency)),
        11.0,
        false,
    );
    writer.line(
        &format!("Balance: {}", amount(report.balance, currency)),
        11.0,
        true,
    );
    writer.gap();

    records_table(&mut writer, "Income Details", &report.incomes, currency);
    writer.gap();
    records_table(&mut writer, "Expense Details", &report.expenses, currency);

    writer.finish()
}
