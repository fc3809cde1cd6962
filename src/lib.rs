//! UzTrans - book translation assistant.
//!
//! This library provides functionality for:
//! - Ingesting a plain-text book and inferring metadata and chapters via an LLM
//! - Translating chapters into Uzbek one at a time, with progress tracking
//! - Persisting the active project and exporting finished chapters as PDF or DOCX

pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod export;
pub mod llm;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;
pub mod utils;
pub mod view;

// Re-export commonly used types
pub use config::Config;
pub use console::Console;
pub use controller::{ProjectController, SkipReason, TranslateOutcome};
pub use error::{
    ConfigError, ExportError, IngestError, InputError, ServiceError, StorageError, TranslateError,
};
pub use export::{ExportDocument, ExportFormat};
pub use llm::LlmClient;
pub use models::{BookMetadata, Chapter, ChapterStatus, Genre, TranslationProject};
pub use service::{BookService, ChapterDraft};
pub use store::{FileStore, MemoryStore, ProjectStore};
