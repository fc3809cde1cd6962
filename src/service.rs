//! Remote inference and translation operations.
//!
//! The controller only talks to this trait, so a deterministic fake can stand
//! in for the network in tests.

use crate::error::ServiceError;
use crate::models::{BookMetadata, Genre};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

/// A chapter proposed by the segmentation call, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct ChapterDraft {
    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub content: String,
}

/// Models sometimes send `null` for a field they could not fill.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ChapterDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// The three opaque remote operations behind the assistant.
///
/// Each is one request/response. There are no retries; a failure surfaces once.
#[async_trait]
pub trait BookService: Send + Sync {
    /// Infers title, author, language, genre and summary from a text sample.
    async fn analyze_metadata(&self, sample: &str) -> Result<BookMetadata, ServiceError>;

    /// Splits the text into ordered chapters. May return an empty list.
    async fn split_into_chapters(&self, text: &str) -> Result<Vec<ChapterDraft>, ServiceError>;

    /// Translates one chapter of text given the book's genre and context.
    async fn translate_chapter(
        &self,
        text: &str,
        genre: Genre,
        context: &str,
    ) -> Result<String, ServiceError>;
}
