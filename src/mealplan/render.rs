//! Meal plan PDF layout.
//!
//! Draws with `printpdf` built-in Helvetica on US Letter pages. Built-in
//! fonts only cover Latin-1, so all text goes through [`pdf_safe`] first.
//! Text width is estimated at half the font size per character, which is
//! close enough for Helvetica to keep wrapped lines inside the margins.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rect, Rgb,
};

use super::sections::{parse_sections, MealLine, PlanSection};

const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
/// 72 pt.
const MARGIN: f32 = 25.4;
const PT_TO_MM: f32 = 0.3528;
const BODY_INDENT: f32 = 7.0;

const TITLE_SIZE: f32 = 24.0;
const HEADER_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const TABLE_HEADER_SIZE: f32 = 14.0;

const DARK_BLUE: (f32, f32, f32) = (0.118, 0.302, 0.549);
const LIGHT_GREY: (f32, f32, f32) = (0.941, 0.941, 0.941);
const FOOTER_BLUE: (f32, f32, f32) = (0.0, 0.0, 1.0);
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const WHITE: (f32, f32, f32) = (1.0, 1.0, 1.0);

const SUBTITLE: &str = "Personalized Nutrition Plan for Ramadan";
const FOOTER: &str = "Feel free to ask questions about your meal plan!";

/// Errors from PDF rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The plan text is blank.
    #[error("meal plan is empty")]
    EmptyPlan,
    /// The PDF library rejected an operation.
    #[error("pdf rendering failed: {0}")]
    Pdf(#[from] printpdf::Error),
}

/// Signature of [`render_meal_plan`]: plan text and name in, PDF bytes out.
pub type PdfRenderer = fn(&str, &str) -> Result<Vec<u8>, RenderError>;

/// File name for the exported plan.
pub fn pdf_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    format!("Meal Plan for {}.pdf", cleaned.trim())
}

/// Render the assistant's meal plan text for `name` into PDF bytes.
///
/// # Errors
///
/// Returns [`RenderError::EmptyPlan`] for blank text, or
/// [`RenderError::Pdf`] if the PDF library fails to load a font or serialize
/// the document.
pub fn render_meal_plan(plan: &str, name: &str) -> Result<Vec<u8>, RenderError> {
    if plan.trim().is_empty() {
        return Err(RenderError::EmptyPlan);
    }
    tracing::info!("starting meal plan PDF generation");
    let title = format!("Meal Plan for {name}");
    let (doc, page, layer) = PdfDocument::new(
        pdf_safe(&title),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let oblique = doc.add_builtin_font(BuiltinFont::HelveticaOblique)?;
    let layer = doc.get_page(page).get_layer(layer);

    let mut writer = PageWriter {
        doc,
        layer,
        cursor: PAGE_HEIGHT - MARGIN,
        regular,
        bold,
        oblique,
    };

    writer.centered(&title, TITLE_SIZE, true, BLACK);
    writer.space(10.0);
    writer.band(SUBTITLE, HEADER_SIZE, LIGHT_GREY, BLACK, true);
    writer.space(4.0);

    let mut previous_was_meals = false;
    for section in parse_sections(plan) {
        let is_meals = matches!(section, PlanSection::Meals(_));
        match section {
            PlanSection::Macros(rows) => {
                writer.band("Total Daily Macronutrients", HEADER_SIZE, DARK_BLUE, WHITE, false);
                writer.space(4.0);
                writer.table(&rows);
                writer.space(7.0);
            }
            PlanSection::Meals(lines) => {
                if !previous_was_meals {
                    writer.band("Meals", HEADER_SIZE, DARK_BLUE, WHITE, false);
                    writer.space(4.0);
                }
                for line in lines {
                    match line {
                        MealLine::Entry {
                            name,
                            details,
                            macros,
                        } => {
                            writer.band(&name, HEADER_SIZE, DARK_BLUE, WHITE, false);
                            writer.paragraph(&details, BODY_SIZE);
                            if let Some(macros) = macros {
                                writer.paragraph(&macros, BODY_SIZE);
                                writer.space(1.5);
                            }
                        }
                        MealLine::Note(text) => writer.paragraph(&text, BODY_SIZE),
                    }
                }
                writer.space(4.0);
            }
            PlanSection::Micronutrients(lines) => {
                writer.band("Total Micronutrients", HEADER_SIZE, DARK_BLUE, WHITE, false);
                writer.space(4.0);
                for line in lines {
                    writer.paragraph(&line, BODY_SIZE);
                }
                writer.space(4.0);
            }
            PlanSection::Tips(lines) => {
                writer.band("Tips for Success", HEADER_SIZE, DARK_BLUE, WHITE, false);
                writer.space(4.0);
                for line in lines {
                    writer.paragraph(&line, BODY_SIZE);
                }
                writer.space(7.0);
            }
        }
        previous_was_meals = is_meals;
    }

    writer.footer(FOOTER);
    let bytes = writer.doc.save_to_bytes()?;
    tracing::info!(bytes = bytes.len(), "PDF generation completed");
    Ok(bytes)
}

/// Cursor-based writer over the current page.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    /// Baseline of the next line, in mm from the page bottom.
    cursor: f32,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl PageWriter {
    fn space(&mut self, mm: f32) {
        self.cursor -= mm;
    }

    /// Start a new page unless `height` mm still fit above the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.cursor - height >= MARGIN {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    fn font(&self, bold: bool) -> &IndirectFontRef {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    fn centered(&mut self, text: &str, size: f32, bold: bool, color: (f32, f32, f32)) {
        let content_width = PAGE_WIDTH - 2.0 * MARGIN;
        for line in wrap_text(text, size, content_width) {
            let line_height = size * PT_TO_MM * 1.2;
            self.reserve(line_height);
            self.cursor -= line_height;
            let x = (PAGE_WIDTH - text_width(&line, size)) / 2.0;
            self.layer.set_fill_color(rgb(color));
            self.layer
                .use_text(line, size, Mm(x.max(MARGIN)), Mm(self.cursor), self.font(bold));
        }
    }

    /// Text on a full-width filled band.
    fn band(
        &mut self,
        text: &str,
        size: f32,
        background: (f32, f32, f32),
        foreground: (f32, f32, f32),
        centered: bool,
    ) {
        let padding = 2.5;
        let line_height = size * PT_TO_MM * 1.2;
        let content_width = PAGE_WIDTH - 2.0 * MARGIN;
        let lines = wrap_text(text, size, content_width - 2.0 * padding);
        let height = line_height * count_f32(lines.len()) + 2.0 * padding;

        self.reserve(height);
        let top = self.cursor;
        let bottom = top - height;
        self.layer.set_fill_color(rgb(background));
        self.layer.add_rect(
            Rect::new(Mm(MARGIN), Mm(bottom), Mm(PAGE_WIDTH - MARGIN), Mm(top))
                .with_mode(PaintMode::Fill),
        );

        let mut baseline = top - padding;
        self.layer.set_fill_color(rgb(foreground));
        for line in lines {
            baseline -= line_height;
            let x = if centered {
                (PAGE_WIDTH - text_width(&line, size)) / 2.0
            } else {
                MARGIN + padding
            };
            self.layer
                .use_text(line, size, Mm(x), Mm(baseline + 1.0), &self.bold);
        }
        self.cursor = bottom - 2.0;
    }

    /// Indented, wrapped body text.
    fn paragraph(&mut self, text: &str, size: f32) {
        let line_height = 14.0 * PT_TO_MM;
        let left = MARGIN + BODY_INDENT;
        let width = PAGE_WIDTH - MARGIN - left;
        self.layer.set_fill_color(rgb(BLACK));
        for line in wrap_text(text, size, width) {
            self.reserve(line_height);
            self.cursor -= line_height;
            self.layer.set_fill_color(rgb(BLACK));
            self.layer
                .use_text(line, size, Mm(left), Mm(self.cursor), &self.regular);
        }
        self.cursor -= 8.0 * PT_TO_MM;
    }

    /// Two-column grid with a blue header row.
    fn table(&mut self, rows: &[(String, String)]) {
        let column = 200.0 * PT_TO_MM;
        let left = (PAGE_WIDTH - 2.0 * column) / 2.0;

        self.table_row(["Nutrient", "Amount"], left, column, true);
        for (nutrient, amount) in rows {
            self.table_row([nutrient.as_str(), amount.as_str()], left, column, false);
        }
    }

    /// One grid row; cells wrap and the row grows to fit the taller one.
    fn table_row(&mut self, cells: [&str; 2], left: f32, column: f32, header: bool) {
        let size = if header { TABLE_HEADER_SIZE } else { BODY_SIZE };
        let min_height = if header { 9.0 } else { 7.5 };
        let line_height = size * PT_TO_MM * 1.2;
        let (cells, height) = cell_layout(cells, size, column, min_height);

        self.reserve(height);
        let top = self.cursor;
        let bottom = top - height;

        for (i, lines) in cells.into_iter().enumerate() {
            let x0 = if i == 0 { left } else { left + column };
            let x1 = x0 + column;
            if header {
                self.layer.set_fill_color(rgb(DARK_BLUE));
                self.layer.add_rect(
                    Rect::new(Mm(x0), Mm(bottom), Mm(x1), Mm(top)).with_mode(PaintMode::Fill),
                );
            }
            self.layer.set_outline_color(rgb(BLACK));
            self.layer.set_outline_thickness(1.0);
            self.layer.add_rect(
                Rect::new(Mm(x0), Mm(bottom), Mm(x1), Mm(top)).with_mode(PaintMode::Stroke),
            );

            self.layer
                .set_fill_color(rgb(if header { WHITE } else { BLACK }));
            let block = line_height * count_f32(lines.len());
            let mut baseline = top - (height - block) / 2.0;
            for line in lines {
                baseline -= line_height;
                let x = x0 + (column - text_width(&line, size)) / 2.0;
                self.layer
                    .use_text(line, size, Mm(x.max(x0)), Mm(baseline + 1.0), self.font(header));
            }
        }
        self.cursor = bottom;
    }

    fn footer(&mut self, text: &str) {
        self.space(6.0);
        let line_height = BODY_SIZE * PT_TO_MM * 1.2;
        self.reserve(line_height);
        self.cursor -= line_height;
        let x = (PAGE_WIDTH - text_width(text, BODY_SIZE)) / 2.0;
        self.layer.set_fill_color(rgb(FOOTER_BLUE));
        self.layer.use_text(
            pdf_safe(text),
            BODY_SIZE,
            Mm(x),
            Mm(self.cursor),
            &self.oblique,
        );
    }
}

fn rgb((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn count_f32(n: usize) -> f32 {
    u16::try_from(n).map(f32::from).unwrap_or(f32::from(u16::MAX))
}

/// Wrapped lines for each cell of a `column` mm wide table row, and the row
/// height in mm.
fn cell_layout(
    cells: [&str; 2],
    size: f32,
    column: f32,
    min_height: f32,
) -> ([Vec<String>; 2], f32) {
    let wrapped = cells.map(|cell| wrap_text(cell, size, column - 2.0));
    let lines = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let height = size * PT_TO_MM * 1.2 * count_f32(lines) + 2.0;
    (wrapped, height.max(min_height))
}

/// Estimated width in mm of `text` at `size` pt.
fn text_width(text: &str, size: f32) -> f32 {
    count_f32(text.chars().count()) * size * 0.5 * PT_TO_MM
}

/// Greedy word wrap to `width` mm. Words wider than a line are hard-cut.
pub fn wrap_text(text: &str, size: f32, width: f32) -> Vec<String> {
    let safe = pdf_safe(text);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in safe.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size) <= width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        let mut piece = String::new();
        for c in word.chars() {
            piece.push(c);
            if text_width(&piece, size) > width {
                piece.pop();
                lines.push(std::mem::take(&mut piece));
                piece.push(c);
            }
        }
        current = piece;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Map text onto what the built-in fonts can draw.
///
/// Typographic punctuation becomes its ASCII form; anything else outside
/// Latin-1 (emoji included) is dropped.
pub fn pdf_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2022}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\t' => out.push(' '),
            c if u32::from(c) <= 0xFF && !c.is_control() => out.push(c),
            _ => {}
        }
    }
    out
}
