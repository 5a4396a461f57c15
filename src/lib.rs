//! Printable marathon bib cards.
//!
//! A CSV roster is mapped to [`records::ParticipantRecord`]s, each record is
//! rendered to an SVG card through a [`theme::ColorTheme`], and the cards are
//! exported as a PDF, a set of JPEGs, or a print-ready HTML page.

pub mod background;
pub mod card;
pub mod error;
pub mod export;
pub mod preview;
pub mod raster;
pub mod records;
pub mod theme;
