// Bib card rendering: one participant record to one SVG document

use std::fmt::Write as _;

use crate::background::BackgroundImage;
use crate::records::ParticipantRecord;
use crate::theme::{ColorTheme, LinearGradient};

// ============================================================================
// Constants
// ============================================================================

/// Card canvas in CSS pixels: 8.25 x 5.25 inches at 96 DPI, bleed included
pub const CARD_WIDTH_PX: f32 = 792.0;
pub const CARD_HEIGHT_PX: f32 = 504.0;

/// Physical card size in inches
pub const CARD_WIDTH_IN: f32 = 8.25;
pub const CARD_HEIGHT_IN: f32 = 5.25;

/// Half of the 0.25in bleed, in pixels; the trim box starts here
const BLEED_INSET_PX: f32 = 12.0;

const CUT_MARK_LEN: f32 = 16.0;
const PADDING: f32 = 32.0;

/// Font sizes in pixels
const TITLE_FONT_SIZE: f32 = 24.0;
const BADGE_FONT_SIZE: f32 = 18.0;
const BIB_FONT_SIZE: f32 = 96.0;
const NAME_FONT_SIZE: f32 = 20.0;
const SMALL_FONT_SIZE: f32 = 14.0;

const FONT_FAMILY: &str = "Inter, Helvetica, Arial, sans-serif";
const TAGLINE: &str = "RUN \u{2022} ACHIEVE \u{2022} INSPIRE";
const LOCATION_LABEL: &str = "FINISH LINE";

/// Text-color tints, matching hex alpha suffixes 10/20/30/40
const TINT_10: f32 = 0.063;
const TINT_20: f32 = 0.125;
const TINT_30: f32 = 0.188;
const TINT_40: f32 = 0.25;

// ============================================================================
// Rendered Card
// ============================================================================

/// A card ready for export, addressable by its bib key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCard {
    pub key: String,
    pub svg: String,
}

pub fn card_key(bib_number: &str) -> String {
    format!("bib-{}", bib_number)
}

/// Renders one record. Pure: the same inputs always give the same markup.
pub fn render_card(
    record: &ParticipantRecord,
    theme: &ColorTheme,
    background: Option<&BackgroundImage>,
) -> RenderedCard {
    let mut svg = String::with_capacity(8 * 1024);
    let w = CARD_WIDTH_PX;
    let h = CARD_HEIGHT_PX;

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{FONT_FAMILY}">"#
    );

    draw_background(&mut svg, theme, background);
    draw_cut_marks(&mut svg);
    draw_header(&mut svg, record, theme);
    draw_bib_number(&mut svg, record, theme);
    draw_participant_info(&mut svg, record, theme);
    draw_tagline(&mut svg, theme);

    svg.push_str("</svg>");

    RenderedCard {
        key: card_key(&record.bib_number),
        svg,
    }
}

// ============================================================================
// Layers
// ============================================================================

fn draw_background(svg: &mut String, theme: &ColorTheme, background: Option<&BackgroundImage>) {
    let (w, h) = (CARD_WIDTH_PX, CARD_HEIGHT_PX);

    match background {
        Some(image) => {
            let _ = write!(
                svg,
                r##"<defs><linearGradient id="shade" x1="0" y1="0" x2="0" y2="1"><stop offset="0" stop-color="#000000" stop-opacity="0.3"/><stop offset="1" stop-color="#000000" stop-opacity="0.1"/></linearGradient></defs><image x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="xMidYMid slice" xlink:href="{}"/><rect width="{w}" height="{h}" fill="url(#shade)"/>"##,
                escape_xml(image.as_data_url())
            );
        }
        None => match LinearGradient::parse(theme.background) {
            Some(gradient) => {
                let line = gradient.line_for(w, h);
                let _ = write!(
                    svg,
                    r#"<defs><linearGradient id="theme" gradientUnits="userSpaceOnUse" x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}">"#,
                    line.x1, line.y1, line.x2, line.y2
                );
                for (offset, color) in gradient.offsets() {
                    let _ = write!(svg, r#"<stop offset="{offset}" stop-color="{color}"/>"#);
                }
                let _ = write!(
                    svg,
                    r#"</linearGradient></defs><rect width="{w}" height="{h}" fill="url(#theme)"/>"#
                );
            }
            None => {
                tracing::warn!(theme = theme.id, "unparseable theme background, using primary color");
                let _ = write!(svg, r#"<rect width="{w}" height="{h}" fill="{}"/>"#, theme.primary);
            }
        },
    }
}

/// L-shaped marks whose vertices sit on the corners of the 8x5in trim box.
fn draw_cut_marks(svg: &mut String) {
    let left = BLEED_INSET_PX;
    let top = BLEED_INSET_PX;
    let right = CARD_WIDTH_PX - BLEED_INSET_PX;
    let bottom = CARD_HEIGHT_PX - BLEED_INSET_PX;
    let len = CUT_MARK_LEN;

    svg.push_str(r##"<g id="cut-marks" fill="none" stroke="#000000" stroke-opacity="0.2" stroke-width="2">"##);
    for (x, y, sx, sy) in [
        (left, top, 1.0, 1.0),
        (right, top, -1.0, 1.0),
        (left, bottom, 1.0, -1.0),
        (right, bottom, -1.0, -1.0),
    ] {
        let _ = write!(
            svg,
            r#"<path d="M{} {} L{} {} L{} {}"/>"#,
            x,
            y + sy * len,
            x,
            y,
            x + sx * len,
            y
        );
    }
    svg.push_str("</g>");
}

fn draw_header(svg: &mut String, record: &ParticipantRecord, theme: &ColorTheme) {
    let center = CARD_WIDTH_PX / 2.0;

    // Title row: trophy icon then uppercase event name, centered as a unit
    let title = record.event_name.to_uppercase();
    let icon = 24.0;
    let gap = 8.0;
    let title_width = approx_text_width(&title, TITLE_FONT_SIZE, 0.64);
    let row_left = center - (icon + gap + title_width) / 2.0;
    let title_baseline = PADDING + 26.0;

    draw_icon(svg, Icon::Trophy, row_left, PADDING + 4.0, icon, theme.text);
    let _ = write!(
        svg,
        r#"<text x="{:.2}" y="{title_baseline}" font-size="{TITLE_FONT_SIZE}" font-weight="700" letter-spacing="0.6" fill="{}">{}</text>"#,
        row_left + icon + gap,
        theme.text,
        escape_xml(&title)
    );

    // Race category pill
    let badge_top = PADDING + 44.0;
    let badge_height = 44.0;
    let badge_width = approx_text_width(&record.race_category, BADGE_FONT_SIZE, 0.55) + 32.0;
    let _ = write!(
        svg,
        r#"<rect x="{:.2}" y="{badge_top}" width="{:.2}" height="{badge_height}" rx="{}" fill="{text}" fill-opacity="{TINT_20}" stroke="{text}" stroke-opacity="{TINT_40}" stroke-width="2"/>"#,
        center - badge_width / 2.0,
        badge_width,
        badge_height / 2.0,
        text = theme.text
    );
    let _ = write!(
        svg,
        r#"<text x="{center}" y="{}" text-anchor="middle" font-size="{BADGE_FONT_SIZE}" font-weight="500" fill="{}">{}</text>"#,
        badge_top + badge_height / 2.0 + BADGE_FONT_SIZE * 0.35,
        theme.text,
        escape_xml(&record.race_category)
    );
}

fn draw_bib_number(svg: &mut String, record: &ParticipantRecord, theme: &ColorTheme) {
    let center_x = CARD_WIDTH_PX / 2.0;
    // Free band between the badge and the participant block
    let band_top = PADDING + 112.0;
    let band_bottom = CARD_HEIGHT_PX - PADDING - 112.0;
    let center_y = (band_top + band_bottom) / 2.0;

    let box_width = approx_text_width(&record.bib_number, BIB_FONT_SIZE, 0.62) + 64.0;
    let box_height = BIB_FONT_SIZE + 32.0;
    let _ = write!(
        svg,
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{box_height}" rx="16" fill="{text}" fill-opacity="{TINT_10}" stroke="{text}" stroke-opacity="{TINT_30}" stroke-width="4"/>"#,
        center_x - box_width / 2.0,
        center_y - box_height / 2.0,
        box_width,
        text = theme.text
    );
    let _ = write!(
        svg,
        r#"<text x="{center_x}" y="{:.2}" text-anchor="middle" font-size="{BIB_FONT_SIZE}" font-weight="900" fill="{}">{}</text>"#,
        center_y + BIB_FONT_SIZE * 0.35,
        theme.text,
        escape_xml(&record.bib_number)
    );
}

fn draw_participant_info(svg: &mut String, record: &ParticipantRecord, theme: &ColorTheme) {
    let left = PADDING;
    let right = CARD_WIDTH_PX - PADDING;
    let name_top = CARD_HEIGHT_PX - PADDING - 112.0;

    draw_icon(svg, Icon::User, left, name_top + 4.0, 20.0, theme.text);
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-size="{NAME_FONT_SIZE}" font-weight="600" fill="{}">{}</text>"#,
        left + 32.0,
        name_top + 21.0,
        theme.text,
        escape_xml(&record.participant_name)
    );

    let row_top = name_top + 40.0;
    let baseline = row_top + 13.0;
    draw_icon(svg, Icon::Calendar, left, row_top, 16.0, theme.text);
    let _ = write!(
        svg,
        r#"<text x="{}" y="{baseline}" font-size="{SMALL_FONT_SIZE}" font-weight="500" fill="{}">{}</text>"#,
        left + 24.0,
        theme.text,
        escape_xml(&record.date)
    );

    let label_width = approx_text_width(LOCATION_LABEL, SMALL_FONT_SIZE, 0.62);
    draw_icon(svg, Icon::MapPin, right - label_width - 24.0, row_top, 16.0, theme.text);
    let _ = write!(
        svg,
        r#"<text x="{right}" y="{baseline}" text-anchor="end" font-size="{SMALL_FONT_SIZE}" font-weight="500" fill="{}">{LOCATION_LABEL}</text>"#,
        theme.text
    );
}

fn draw_tagline(svg: &mut String, theme: &ColorTheme) {
    let divider_y = CARD_HEIGHT_PX - PADDING - 36.0;
    let _ = write!(
        svg,
        r#"<line x1="{}" y1="{divider_y}" x2="{}" y2="{divider_y}" stroke="{}" stroke-opacity="{TINT_30}" stroke-width="1"/>"#,
        PADDING,
        CARD_WIDTH_PX - PADDING,
        theme.text
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="{SMALL_FONT_SIZE}" font-weight="700" letter-spacing="1.4" fill="{}">{TAGLINE}</text>"#,
        CARD_WIDTH_PX / 2.0,
        divider_y + 31.0,
        theme.text
    );
}

// ============================================================================
// Icons
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Icon {
    Trophy,
    User,
    Calendar,
    MapPin,
}

impl Icon {
    /// Stroke-only path data on a 24x24 grid
    fn paths(self) -> &'static str {
        match self {
            Icon::Trophy => {
                r#"<path d="M7 3h10v6a5 5 0 0 1-10 0z"/><path d="M7 5H4a3 3 0 0 0 3 5"/><path d="M17 5h3a3 3 0 0 1-3 5"/><path d="M12 14v4"/><path d="M8 21h8"/><path d="M9 18h6v3H9z"/>"#
            }
            Icon::User => r#"<circle cx="12" cy="8" r="4"/><path d="M4 21a8 8 0 0 1 16 0"/>"#,
            Icon::Calendar => {
                r#"<rect x="3" y="5" width="18" height="16" rx="2"/><path d="M3 10h18"/><path d="M8 3v4"/><path d="M16 3v4"/>"#
            }
            Icon::MapPin => {
                r#"<path d="M12 22s7-6.2 7-12a7 7 0 0 0-14 0c0 5.8 7 12 7 12z"/><circle cx="12" cy="10" r="2.5"/>"#
            }
        }
    }
}

fn draw_icon(svg: &mut String, icon: Icon, x: f32, y: f32, size: f32, color: &str) {
    let _ = write!(
        svg,
        r#"<g transform="translate({x:.2} {y:.2}) scale({:.4})" fill="none" stroke="{color}" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">{}</g>"#,
        size / 24.0,
        icon.paths()
    );
}

// ============================================================================
// Text Utilities
// ============================================================================

/// Rough advance width; good enough to center icon+text rows and size boxes.
fn approx_text_width(text: &str, font_size: f32, em_ratio: f32) -> f32 {
    text.chars().count() as f32 * font_size * em_ratio
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
