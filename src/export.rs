// Export pipeline: PDF document, JPEG set and print-ready HTML

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};

use crate::background::BackgroundImage;
use crate::card::{card_key, render_card, RenderedCard, CARD_HEIGHT_IN, CARD_WIDTH_IN};
use crate::error::AppError;
use crate::preview::PreviewState;
use crate::raster::{flatten_onto_white, write_jpeg, Rasterizer, RASTER_WIDTH_PX};
use crate::records::ParticipantRecord;
use crate::theme::ColorTheme;

const MM_PER_INCH: f32 = 25.4;

/// Delay before the print window closes itself
const PRINT_CLOSE_DELAY_MS: u32 = 500;

// ============================================================================
// Card Index
// ============================================================================

/// A later record whose bib key was already claimed by an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub key: String,
    /// 0-based row that owns the key
    pub first_row: usize,
    /// 0-based row that lost it
    pub row: usize,
}

/// Every record's rendered card, keyed by `bib-<number>`.
///
/// The first record to claim a key owns it. Later records with the same bib
/// number are recorded as collisions and are skipped by every export.
#[derive(Debug, Default)]
pub struct CardIndex {
    cards: HashMap<String, (usize, RenderedCard)>,
    collisions: Vec<Collision>,
}

impl CardIndex {
    pub fn build(
        records: &[ParticipantRecord],
        theme: &ColorTheme,
        background: Option<&BackgroundImage>,
    ) -> Self {
        let mut index = Self::default();

        for (row, record) in records.iter().enumerate() {
            let key = card_key(&record.bib_number);
            match index.cards.get(&key) {
                Some((first_row, _)) => {
                    tracing::warn!(%key, first_row, row, "duplicate bib number, card will be skipped");
                    index.collisions.push(Collision {
                        key,
                        first_row: *first_row,
                        row,
                    });
                }
                None => {
                    let card = render_card(record, theme, background);
                    index.cards.insert(key, (row, card));
                }
            }
        }

        index
    }

    /// The card for the record at `row`, unless another row owns its key.
    pub fn locate(&self, row: usize, record: &ParticipantRecord) -> Option<&RenderedCard> {
        self.cards
            .get(&card_key(&record.bib_number))
            .filter(|(owner, _)| *owner == row)
            .map(|(_, card)| card)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }
}

// ============================================================================
// Reports and Filenames
// ============================================================================

/// What an export produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Files written, in record order
    pub artifacts: Vec<PathBuf>,
    /// Cards placed into the output
    pub located: usize,
    /// Keys of records whose card could not be located
    pub skipped: Vec<String>,
}

pub fn pdf_filename(date: NaiveDate) -> String {
    format!("marathon-bibs-{}.pdf", date.format("%Y-%m-%d"))
}

pub fn print_filename(date: NaiveDate) -> String {
    format!("marathon-bibs-print-{}.html", date.format("%Y-%m-%d"))
}

/// `bib-<number>-<name with whitespace runs as hyphens>.jpg`
///
/// Path separators and characters that filesystems reject become `-`, so the
/// name always stays a single file inside the output directory.
pub fn filename_for(record: &ParticipantRecord) -> String {
    let name = hyphenate_whitespace(&record.participant_name);
    sanitize_filename(&format!("bib-{}-{}.jpg", record.bib_number, name))
}

fn hyphenate_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

/// Appends `-2`, `-3`, ... before the extension until `name` is not in
/// `taken`.
fn unique_filename(name: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&name) {
        return name;
    }
    let stem = name.strip_suffix(".jpg").unwrap_or(&name);
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}.jpg", stem, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Resolves every record's card in order. Records whose key is missing or
/// owned by another row are noted in `skipped` and left out.
fn located_cards<'a>(
    state: &'a PreviewState,
    index: &'a CardIndex,
    skipped: &mut Vec<String>,
) -> Vec<(&'a ParticipantRecord, &'a RenderedCard)> {
    let mut located = Vec::with_capacity(state.records().len());
    for (row, record) in state.records().iter().enumerate() {
        match index.locate(row, record) {
            Some(card) => located.push((record, card)),
            None => {
                tracing::warn!(row, bib = %record.bib_number, "card not found, skipping");
                skipped.push(card_key(&record.bib_number));
            }
        }
    }
    located
}

// ============================================================================
// PDF Export
// ============================================================================

/// One landscape 8.25x5.25in page per located card, zero margin.
pub fn export_pdf(
    state: &PreviewState,
    rasterizer: &Rasterizer,
    output_path: &Path,
) -> Result<ExportReport, AppError> {
    let mut report = ExportReport::default();
    if state.records().is_empty() {
        return Ok(report);
    }

    let index = CardIndex::build(state.records(), state.theme(), state.background());
    let page_width = Mm(CARD_WIDTH_IN * MM_PER_INCH);
    let page_height = Mm(CARD_HEIGHT_IN * MM_PER_INCH);

    let (doc, page1, layer1) =
        PdfDocument::new("Marathon BIBs", page_width, page_height, "Layer 1");
    let mut located = 0;

    for (record, card) in located_cards(state, &index, &mut report.skipped) {
        let layer = if located == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page, layer) = doc.add_page(page_width, page_height, "Layer 1");
            doc.get_page(page).get_layer(layer)
        };

        tracing::debug!(bib = %record.bib_number, page = located + 1, "rasterizing card for PDF");
        let rgb_image = flatten_onto_white(&rasterizer.rasterize(&card.svg)?);
        let (width, height) = rgb_image.dimensions();

        let image = Image::from(ImageXObject {
            width: Px(width as usize),
            height: Px(height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: rgb_image.into_raw(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // Pixels per inch that make the raster span the full page width
        let dpi = RASTER_WIDTH_PX as f32 / CARD_WIDTH_IN;

        image.add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(0.0)),
                translate_y: Some(Mm(0.0)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        located += 1;
    }

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer)
        .map_err(|e| AppError::PdfError(e.to_string()))?;

    report.located = located;
    report.artifacts.push(output_path.to_path_buf());
    Ok(report)
}

// ============================================================================
// Image Export
// ============================================================================

/// One JPEG per located card, written in record order. A failure stops the
/// run; files already written stay on disk.
pub fn export_images(
    state: &PreviewState,
    rasterizer: &Rasterizer,
    out_dir: &Path,
) -> Result<ExportReport, AppError> {
    let mut report = ExportReport::default();
    if state.records().is_empty() {
        return Ok(report);
    }

    fs::create_dir_all(out_dir)?;
    let index = CardIndex::build(state.records(), state.theme(), state.background());

    let mut taken = HashSet::new();

    for (record, card) in located_cards(state, &index, &mut report.skipped) {
        let wanted = filename_for(record);
        let filename = unique_filename(wanted.clone(), &taken);
        if filename != wanted {
            tracing::warn!(
                bib = %record.bib_number,
                %wanted,
                %filename,
                "filename already used by an earlier card in this export"
            );
        }
        let path = out_dir.join(&filename);
        taken.insert(filename);
        tracing::debug!(path = %path.display(), "rasterizing card for JPEG");

        let rgb_image = flatten_onto_white(&rasterizer.rasterize(&card.svg)?);
        let file = File::create(&path)?;
        write_jpeg(&rgb_image, BufWriter::new(file))?;

        report.located += 1;
        report.artifacts.push(path);
    }

    Ok(report)
}

// ============================================================================
// Print Export
// ============================================================================

/// Writes a standalone HTML document with one fixed-size block per located
/// card. Opening it triggers the browser print dialog.
pub fn export_print(state: &PreviewState, output_path: &Path) -> Result<ExportReport, AppError> {
    let mut report = ExportReport::default();
    if state.records().is_empty() {
        return Ok(report);
    }

    let index = CardIndex::build(state.records(), state.theme(), state.background());
    let blocks: Vec<String> = located_cards(state, &index, &mut report.skipped)
        .into_iter()
        .map(|(_, card)| {
            format!(
                "<div class=\"bib-card\" id=\"{}\">{}</div>",
                crate::card::escape_xml(&card.key),
                card.svg
            )
        })
        .collect();

    report.located = blocks.len();
    fs::write(output_path, print_document(&blocks))?;
    report.artifacts.push(output_path.to_path_buf());
    Ok(report)
}

fn print_document(blocks: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Marathon BIBs - Print</title>
    <style>
      * {{ margin: 0; padding: 0; box-sizing: border-box; }}
      body {{ font-family: 'Inter', sans-serif; background: white; }}
      @page {{ size: {w}in {h}in landscape; margin: 0; }}
      .bib-card {{
        width: {w}in;
        height: {h}in;
        page-break-after: always;
        position: relative;
        overflow: hidden;
        print-color-adjust: exact;
        -webkit-print-color-adjust: exact;
      }}
      .bib-card:last-child {{ page-break-after: avoid; }}
      .bib-card > svg {{ display: block; width: 100%; height: 100%; }}
    </style>
  </head>
  <body>
{body}
    <script>
      window.addEventListener('load', function () {{
        window.print();
        setTimeout(function () {{ window.close(); }}, {delay});
      }});
    </script>
  </body>
</html>
"#,
        w = CARD_WIDTH_IN,
        h = CARD_HEIGHT_IN,
        body = blocks.join("\n"),
        delay = PRINT_CLOSE_DELAY_MS,
    )
}
