//! Error types for the UzTrans application.
//!
//! Uses `thiserror` for structured error definitions, one enum per concern:
//! user input, the remote service, persistence, export and configuration.

use thiserror::Error;

/// Input-validation errors. The operation is aborted and no state is mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The uploaded file holds no text
    #[error("File is empty or could not be read")]
    EmptyFile,

    /// The file could not be decoded as UTF-8 text
    #[error("Could not read file {path}: {message}")]
    Unreadable { path: String, message: String },

    /// The selected chapter has no text to translate
    #[error("This chapter has no text to translate")]
    EmptyChapter,

    /// Segmentation left nothing worth translating
    #[error("No usable text was found in the book")]
    NoUsableChapters,

    /// An operation needs a loaded project
    #[error("No project is loaded")]
    NoProject,

    /// Chapter index outside the project's chapter list
    #[error("Chapter {index} does not exist (project has {total} chapters)")]
    ChapterOutOfRange { index: usize, total: usize },
}

/// Error type for the remote inference/translation service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// HTTP request to API failed
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error: {0}")]
    ApiError(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The request carried no text
    #[error("{operation} failed: input text is empty")]
    EmptyInput { operation: &'static str },
}

/// Error type for project persistence.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read or write the record
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or deserialize the record
    #[error("Malformed project record: {0}")]
    Serde(#[from] serde_json::Error),

    /// Record larger than the configured store limit
    #[error("Storage quota exceeded: record is {size} bytes, limit is {limit}")]
    QuotaExceeded { size: usize, limit: usize },
}

/// Error type for PDF/DOCX export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The PDF renderer failed
    #[error("PDF rendering failed: {0}")]
    Render(String),

    /// Building the DOCX package failed
    #[error("DOCX packaging failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Writing the output file failed
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Missing required configuration value
    #[error("Missing required config value: {0}")]
    MissingValue(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Failure of an ingestion attempt.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Failure of a chapter translation attempt.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error(transparent)]
    Input(#[from] InputError),

    /// Another chapter is still being translated
    #[error("Chapter '{title}' is already being translated")]
    Busy { title: String },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Result type alias using anyhow for application-level error handling.
pub type Result<T> = anyhow::Result<T>;
