// Preview state and its pure transitions

use crate::background::BackgroundImage;
use crate::card::{render_card, RenderedCard};
use crate::records::ParticipantRecord;
use crate::theme::{default_theme, ColorTheme};

/// Everything a preview (and every export) is rendered from.
///
/// Transitions consume the state and return the next one, so a sequence of
/// user actions is just a chain of calls. `cursor` always indexes `records`
/// when `records` is non-empty, and is 0 otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewState {
    records: Vec<ParticipantRecord>,
    theme: &'static ColorTheme,
    background: Option<BackgroundImage>,
    cursor: usize,
}

impl Default for PreviewState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            theme: default_theme(),
            background: None,
            cursor: 0,
        }
    }
}

impl PreviewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the roster wholesale and rewinds to the first card.
    pub fn load_records(self, records: Vec<ParticipantRecord>) -> Self {
        Self {
            records,
            cursor: 0,
            ..self
        }
    }

    pub fn select_theme(self, theme: &'static ColorTheme) -> Self {
        Self { theme, ..self }
    }

    /// `None` reverts to the theme background.
    pub fn set_background(self, background: Option<BackgroundImage>) -> Self {
        Self { background, ..self }
    }

    pub fn next(self) -> Self {
        if self.records.is_empty() {
            return self;
        }
        let cursor = (self.cursor + 1) % self.records.len();
        Self { cursor, ..self }
    }

    pub fn previous(self) -> Self {
        if self.records.is_empty() {
            return self;
        }
        let len = self.records.len();
        let cursor = (self.cursor + len - 1) % len;
        Self { cursor, ..self }
    }

    /// Moves `steps` cards forward (positive) or back (negative).
    pub fn step(self, steps: i64) -> Self {
        if self.records.is_empty() {
            return self;
        }
        let len = self.records.len() as i128;
        let cursor = (self.cursor as i128 + steps as i128).rem_euclid(len) as usize;
        Self { cursor, ..self }
    }

    pub fn records(&self) -> &[ParticipantRecord] {
        &self.records
    }

    pub fn theme(&self) -> &'static ColorTheme {
        self.theme
    }

    pub fn background(&self) -> Option<&BackgroundImage> {
        self.background.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&ParticipantRecord> {
        self.records.get(self.cursor)
    }

    /// 1-based position and total, for an "N of M" label.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current().map(|_| (self.cursor() + 1, self.records.len()))
    }

    /// The card currently on show; nothing when no records are loaded.
    pub fn render_current(&self) -> Option<RenderedCard> {
        self.current()
            .map(|record| render_card(record, self.theme, self.background.as_ref()))
    }
}
