use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to parse CSV file: {0}")]
    CsvError(String),
    #[error("Unknown theme '{0}' (available: {1})")]
    ThemeError(String, String),
    #[error("Failed to load background image: {0}")]
    BackgroundError(String),
    #[error("Failed to rasterize card: {0}")]
    RasterError(String),
    #[error("Failed to create PDF: {0}")]
    PdfError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
