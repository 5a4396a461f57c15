// CSV roster parsing and row-to-record mapping

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::Local;
use serde::Serialize;

use crate::error::AppError;

/// One parsed CSV row, keyed by header label.
pub type Row = HashMap<String, String>;

/// The content of one bib card. Every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    pub event_name: String,
    pub race_category: String,
    pub bib_number: String,
    pub participant_name: String,
    pub date: String,
}

const DEFAULT_EVENT_NAME: &str = "Marathon Event";
const DEFAULT_RACE_CATEGORY: &str = "Full Marathon";
const DEFAULT_PARTICIPANT_NAME: &str = "Runner";

/// Today's date as a short local date string, e.g. `4/15/2024`.
pub fn today_string() -> String {
    Local::now().date_naive().format("%-m/%-d/%Y").to_string()
}

/// Reads a roster file and maps every row. Either all rows load or none do.
pub fn load_records(path: &Path, today: &str) -> Result<Vec<ParticipantRecord>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::CsvError(format!("{}: {}", path.display(), e)))?;
    let rows = parse_rows(BufReader::new(file))?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "parsed roster");
    Ok(map_rows(&rows, today))
}

/// Parses delimited text with a header row. Blank lines are skipped; a row
/// whose field count differs from the header fails the whole parse.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<Row>, AppError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| AppError::CsvError(e.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| AppError::CsvError(e.to_string()))?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Maps rows to records, preserving order. `today` fills a missing date.
pub fn map_rows(rows: &[Row], today: &str) -> Vec<ParticipantRecord> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| map_row(row, index, today))
        .collect()
}

fn map_row(row: &Row, index: usize, today: &str) -> ParticipantRecord {
    ParticipantRecord {
        event_name: field(row, "Event Name", "eventName")
            .unwrap_or(DEFAULT_EVENT_NAME)
            .to_string(),
        race_category: field(row, "Race Category", "raceCategory")
            .unwrap_or(DEFAULT_RACE_CATEGORY)
            .to_string(),
        bib_number: field(row, "BIB Number", "bibNumber")
            .map(str::to_string)
            .unwrap_or_else(|| (index + 1).to_string()),
        participant_name: field(row, "Participant Name", "participantName")
            .unwrap_or(DEFAULT_PARTICIPANT_NAME)
            .to_string(),
        date: field(row, "Date", "date").unwrap_or(today).to_string(),
    }
}

/// Header spelling first, then the camelCase alias. Empty values count as absent.
fn field<'a>(row: &'a Row, header: &str, alias: &str) -> Option<&'a str> {
    [header, alias]
        .iter()
        .filter_map(|key| row.get(*key))
        .map(String::as_str)
        .find(|value| !value.is_empty())
}
