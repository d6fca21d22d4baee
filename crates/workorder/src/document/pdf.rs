//! Drawing a [`Layout`] onto A4 pages with `printpdf`.
//!
//! All geometry is in points measured from the bottom-left corner of the page.

use std::fs::File;

use printpdf::image_crate::{self, DynamicImage, RgbImage};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rect, Rgb,
};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::logo::Logo;

use super::layout::{Block, Field, Layout, PageHeader, ServiceRow};
use super::FontSource;

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN_X: f32 = 40.0;
const MARGIN_TOP: f32 = 100.0;
const MARGIN_BOTTOM: f32 = 40.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

/// 0.7 inch.
const LOGO_SIZE: f32 = 50.4;
const LOGO_DPI: f32 = 300.0;

const LEADING: f32 = 1.2;
const CELL_PADDING: f32 = 3.0;

const TABLE_COLUMNS: [f32; 4] = [36.0, 216.0, 144.0, 108.0];
const TOTAL_LABEL_WIDTH: f32 = 144.0;
const TOTAL_VALUE_WIDTH: f32 = 108.0;

const NAVY: u32 = 0x0000_3366;
const HEADING: u32 = 0x0033_3333;
const LABEL: u32 = 0x0066_6666;
const GRID: u32 = 0x00DD_DDDD;
const WHITESMOKE: u32 = 0x00F5_F5F5;
const TOTAL_BACKGROUND: u32 = 0x00E0_F2F7;
const RED: u32 = 0x00FF_0000;
const BLACK: u32 = 0x0000_0000;

/// Render a layout to PDF bytes.
///
/// A logo that cannot be decoded is logged and left out.
///
/// # Errors
///
/// Returns an error if a font file cannot be loaded or the document cannot be
/// serialized.
pub fn render_pdf(layout: &Layout, logo: Option<&Logo>, fonts: &FontSource) -> Result<Vec<u8>> {
    render_pages(layout, logo, fonts).map(|(bytes, _)| bytes)
}

/// What a render pass drew, page by page.
#[derive(Debug, Default)]
pub(crate) struct PageSummary {
    pub(crate) pages: usize,
    /// 1-based pages on which the service table header was drawn.
    pub(crate) table_header_pages: Vec<usize>,
}

/// Render a layout, also returning a summary of the pages drawn.
pub(crate) fn render_pages(
    layout: &Layout,
    logo: Option<&Logo>,
    fonts: &FontSource,
) -> Result<(Vec<u8>, PageSummary)> {
    let (doc, page, layer) = PdfDocument::new(
        layout.header.title.as_str(),
        Mm(210.0),
        Mm(297.0),
        "Layer 1",
    );
    let fonts = Fonts::load(&doc, fonts)?;
    let logo = logo.and_then(prepare_logo);

    let summary = {
        let first = doc.get_page(page).get_layer(layer);
        let mut canvas = Canvas::new(&doc, first, fonts, &layout.header, logo.as_ref());
        for block in &layout.blocks {
            canvas.draw(block);
        }
        canvas.summary
    };

    let bytes = doc.save_to_bytes().map_err(|e| Error::document(e.to_string()))?;
    debug!(pages = summary.pages, bytes = bytes.len(), "Rendered document");
    Ok((bytes, summary))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, source: &FontSource) -> Result<Self> {
        match source {
            FontSource::Builtin => Ok(Self {
                regular: doc
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| Error::document(e.to_string()))?,
                bold: doc
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(|e| Error::document(e.to_string()))?,
            }),
            FontSource::Files { regular, bold } => {
                let load = |path: &std::path::Path| -> Result<IndirectFontRef> {
                    let file = File::open(path)?;
                    doc.add_external_font(file)
                        .map_err(|e| Error::document(format!("{}: {e}", path.display())))
                };
                Ok(Self {
                    regular: load(regular)?,
                    bold: load(bold)?,
                })
            }
        }
    }

    fn get(&self, bold: bool) -> &IndirectFontRef {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }
}

fn prepare_logo(logo: &Logo) -> Option<DynamicImage> {
    match image_crate::load_from_memory(&logo.bytes) {
        Ok(image) => Some(DynamicImage::ImageRgb8(flatten_on_white(&image))),
        Err(e) => {
            warn!(kind = %logo.kind, error = %e, "Skipping undecodable logo");
            None
        }
    }
}

/// PDF images carry no alpha here; composite transparent pixels onto white.
fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            u8::try_from((c * a + 255 * (255 - a)) / 255).unwrap_or(u8::MAX)
        };
        image_crate::Rgb([blend(r), blend(g), blend(b)])
    })
}

fn color(hex: u32) -> Color {
    let [_, r, g, b] = hex.to_be_bytes();
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

/// Approximate advance width; Helvetica averages about half an em per glyph.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let em = if bold { 0.55 } else { 0.5 };
    text.chars().count() as f32 * size * em
}

/// Greedy word wrap to `max_width`. Words longer than a line are split.
/// Always returns at least one line.
pub(crate) fn wrap(text: &str, size: f32, bold: bool, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, size, bold) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                current.push(ch);
                if text_width(&current, size, bold) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn line_height(size: f32) -> f32 {
    size * LEADING
}

struct Canvas<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    header: &'a PageHeader,
    logo: Option<&'a DynamicImage>,
    /// Top of the free area on the current page.
    y: f32,
    summary: PageSummary,
}

impl<'a> Canvas<'a> {
    fn new(
        doc: &'a PdfDocumentReference,
        layer: PdfLayerReference,
        fonts: Fonts,
        header: &'a PageHeader,
        logo: Option<&'a DynamicImage>,
    ) -> Self {
        let canvas = Self {
            doc,
            layer,
            fonts,
            header,
            logo,
            y: PAGE_HEIGHT - MARGIN_TOP,
            summary: PageSummary {
                pages: 1,
                table_header_pages: Vec::new(),
            },
        };
        canvas.draw_page_header();
        canvas
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.summary.pages += 1;
        self.y = PAGE_HEIGHT - MARGIN_TOP;
        self.draw_page_header();
    }

    /// Start a new page unless `height` fits above the bottom margin.
    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, text: &str, x: f32, baseline: f32, size: f32, bold: bool, fill: u32) {
        self.layer.set_fill_color(color(fill));
        self.layer
            .use_text(text, size, mm(x), mm(baseline), self.fonts.get(bold));
    }

    #[allow(clippy::too_many_arguments)]
    fn centered(&self, text: &str, left: f32, width: f32, baseline: f32, size: f32, bold: bool, fill: u32) {
        let x = left + (width - text_width(text, size, bold)) / 2.0;
        self.text(text, x.max(left), baseline, size, bold, fill);
    }

    fn labeled(&self, field: &Field, x: f32, baseline: f32, size: f32, fill: u32) {
        let label = format!("{}: ", field.label);
        self.text(&label, x, baseline, size, true, fill);
        let offset = text_width(&label, size, true);
        self.text(&field.value, x + offset, baseline, size, false, fill);
    }

    fn fill_rect(&self, x: f32, y: f32, width: f32, height: f32, fill: u32) {
        self.layer.set_fill_color(color(fill));
        let rect = Rect::new(mm(x), mm(y), mm(x + width), mm(y + height)).with_mode(PaintMode::Fill);
        self.layer.add_rect(rect);
    }

    fn stroke_rect(&self, x: f32, y: f32, width: f32, height: f32, stroke: u32) {
        self.layer.set_outline_color(color(stroke));
        self.layer.set_outline_thickness(1.0);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(mm(x), mm(y)), false),
                (Point::new(mm(x + width), mm(y)), false),
                (Point::new(mm(x + width), mm(y + height)), false),
                (Point::new(mm(x), mm(y + height)), false),
            ],
            is_closed: true,
        });
    }

    fn rule(&self, x1: f32, x2: f32, y: f32, stroke: u32) {
        self.layer.set_outline_color(color(stroke));
        self.layer.set_outline_thickness(0.8);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(mm(x1), mm(y)), false),
                (Point::new(mm(x2), mm(y)), false),
            ],
            is_closed: false,
        });
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_page_header(&self) {
        if let Some(image) = self.logo {
            let width_pt = image.width().max(1) as f32 / LOGO_DPI * 72.0;
            let height_pt = image.height().max(1) as f32 / LOGO_DPI * 72.0;
            let scale = (LOGO_SIZE / width_pt).min(LOGO_SIZE / height_pt);
            Image::from_dynamic_image(image).add_to_layer(
                self.layer.clone(),
                ImageTransform {
                    translate_x: Some(mm(MARGIN_X)),
                    translate_y: Some(mm(PAGE_HEIGHT - 20.0 - height_pt * scale)),
                    scale_x: Some(scale),
                    scale_y: Some(scale),
                    dpi: Some(LOGO_DPI),
                    ..Default::default()
                },
            );
        }

        let header = self.header;
        self.centered(&header.title, MARGIN_X, CONTENT_WIDTH, PAGE_HEIGHT - 45.0, 16.0, true, BLACK);
        self.centered(&header.address, MARGIN_X, CONTENT_WIDTH, PAGE_HEIGHT - 62.0, 9.0, false, BLACK);
        self.centered(&header.contact, MARGIN_X, CONTENT_WIDTH, PAGE_HEIGHT - 73.0, 9.0, false, BLACK);
    }

    fn draw(&mut self, block: &Block) {
        match block {
            Block::Title(title) => self.draw_title(title),
            Block::Meta(left, right) => self.draw_meta(left, right),
            Block::Heading(text) => self.draw_heading(text),
            Block::Fields(rows) => self.draw_fields(rows),
            Block::ServiceTable { header, rows } => self.draw_table(header, rows),
            Block::Total { label, value } => self.draw_total(label, value),
            Block::Paragraph(text) => self.draw_paragraph(text),
            Block::Signatures(captions) => self.draw_signatures(captions),
            Block::Spacer(gap) => {
                if self.y - gap < MARGIN_BOTTOM {
                    self.new_page();
                } else {
                    self.y -= gap;
                }
            }
        }
    }

    fn draw_title(&mut self, title: &str) {
        let size = 18.0;
        self.ensure(line_height(size) + 10.0);
        self.centered(title, MARGIN_X, CONTENT_WIDTH, self.y - size, size, true, NAVY);
        self.y -= line_height(size) + 10.0;
    }

    fn draw_meta(&mut self, left: &Field, right: &Field) {
        let size = 9.0;
        self.ensure(line_height(size) + 4.0);
        let baseline = self.y - size;
        self.labeled(left, MARGIN_X, baseline, size, LABEL);
        self.labeled(right, MARGIN_X + CONTENT_WIDTH / 2.0, baseline, size, LABEL);
        self.y -= line_height(size) + 4.0;
    }

    fn draw_heading(&mut self, text: &str) {
        let size = 12.0;
        // Keep the heading with at least a couple of lines of what follows.
        self.ensure(10.0 + line_height(size) + 5.0 + 30.0);
        self.y -= 10.0;
        self.text(text, MARGIN_X, self.y - size, size, true, HEADING);
        self.y -= line_height(size) + 5.0;
    }

    fn draw_fields(&mut self, rows: &[[Field; 2]]) {
        let size = 10.0;
        let column = CONTENT_WIDTH / 2.0;

        for row in rows {
            let wrapped: Vec<(f32, Vec<String>)> = row
                .iter()
                .map(|field| {
                    let offset = text_width(&format!("{}: ", field.label), size, true);
                    let lines = wrap(&field.value, size, false, (column - offset - 6.0).max(size));
                    (offset, lines)
                })
                .collect();
            let count = wrapped.iter().map(|(_, lines)| lines.len()).max().unwrap_or(1);
            #[allow(clippy::cast_precision_loss)]
            let height = count as f32 * line_height(size) + 4.0;
            self.ensure(height);

            for (i, (field, (offset, lines))) in row.iter().zip(&wrapped).enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let x = MARGIN_X + column * i as f32;
                let mut baseline = self.y - size;
                self.text(&format!("{}: ", field.label), x, baseline, size, true, BLACK);
                for line in lines {
                    self.text(line, x + offset, baseline, size, false, BLACK);
                    baseline -= line_height(size);
                }
            }
            self.y -= height;
        }
    }

    fn table_left() -> f32 {
        MARGIN_X + (CONTENT_WIDTH - TABLE_COLUMNS.iter().sum::<f32>()) / 2.0
    }

    fn draw_table_header(&mut self, header: &[&str; 4]) {
        let size = 9.0;
        let height = line_height(size) + 2.0 * CELL_PADDING;
        let bottom = self.y - height;
        let mut x = Self::table_left();
        let width: f32 = TABLE_COLUMNS.iter().sum();
        self.summary.table_header_pages.push(self.summary.pages);

        self.fill_rect(x, bottom, width, height, NAVY);
        for (caption, column) in header.iter().zip(TABLE_COLUMNS) {
            self.stroke_rect(x, bottom, column, height, GRID);
            self.centered(caption, x, column, self.y - CELL_PADDING - size, size, true, WHITESMOKE);
            x += column;
        }
        self.y = bottom;
    }

    fn draw_table(&mut self, header: &[&str; 4], rows: &[ServiceRow]) {
        let size = 9.0;
        let header_height = line_height(size) + 2.0 * CELL_PADDING;
        self.ensure(header_height * 2.0);
        self.draw_table_header(header);

        for row in rows {
            let cells = [&row.item, &row.description, &row.responsible, &row.value];
            let wrapped: Vec<Vec<String>> = cells
                .iter()
                .zip(TABLE_COLUMNS)
                .map(|(cell, column)| wrap(cell, size, false, column - 2.0 * CELL_PADDING))
                .collect();
            let count = wrapped.iter().map(Vec::len).max().unwrap_or(1);
            #[allow(clippy::cast_precision_loss)]
            let height = count as f32 * line_height(size) + 2.0 * CELL_PADDING;

            if self.y - height < MARGIN_BOTTOM {
                self.new_page();
                self.draw_table_header(header);
            }

            let bottom = self.y - height;
            let mut x = Self::table_left();
            for (lines, column) in wrapped.iter().zip(TABLE_COLUMNS) {
                self.stroke_rect(x, bottom, column, height, GRID);
                let mut baseline = self.y - CELL_PADDING - size;
                for line in lines {
                    self.centered(line, x, column, baseline, size, false, BLACK);
                    baseline -= line_height(size);
                }
                x += column;
            }
            self.y = bottom;
        }
    }

    fn draw_total(&mut self, label: &str, value: &str) {
        let size = 11.0;
        let height = line_height(size) + 2.0 * CELL_PADDING;
        self.ensure(height);

        let right = Self::table_left() + TABLE_COLUMNS.iter().sum::<f32>();
        let value_x = right - TOTAL_VALUE_WIDTH;
        let label_x = value_x - TOTAL_LABEL_WIDTH;
        let bottom = self.y - height;
        let baseline = self.y - CELL_PADDING - size;

        self.fill_rect(label_x, bottom, TOTAL_LABEL_WIDTH + TOTAL_VALUE_WIDTH, height, TOTAL_BACKGROUND);
        self.stroke_rect(label_x, bottom, TOTAL_LABEL_WIDTH, height, NAVY);
        self.stroke_rect(value_x, bottom, TOTAL_VALUE_WIDTH, height, NAVY);

        let label_width = text_width(label, size, true);
        self.text(label, value_x - CELL_PADDING - label_width, baseline, size, true, BLACK);
        self.centered(value, value_x, TOTAL_VALUE_WIDTH, baseline, size, true, RED);
        self.y = bottom;
    }

    fn draw_paragraph(&mut self, text: &str) {
        let size = 10.0;
        for line in wrap(text, size, false, CONTENT_WIDTH) {
            self.ensure(line_height(size));
            self.text(&line, MARGIN_X, self.y - size, size, false, BLACK);
            self.y -= line_height(size);
        }
    }

    fn draw_signatures(&mut self, captions: &[&str; 2]) {
        let size = 10.0;
        let space = 30.0;
        self.ensure(space + line_height(size) + 4.0);

        let column = CONTENT_WIDTH / 2.0;
        let line_y = self.y - space;
        for (i, caption) in captions.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let x = MARGIN_X + column * i as f32;
            self.rule(x + 20.0, x + column - 20.0, line_y, BLACK);
            self.centered(caption, x, column, line_y - 4.0 - size, size, true, BLACK);
        }
        self.y = line_y - 4.0 - line_height(size);
    }
}
