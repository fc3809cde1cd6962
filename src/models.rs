//! Project, chapter and metadata types.
//!
//! These are persisted as-is, so the serde attributes define the on-disk
//! record format (camelCase keys, lowercase enum literals).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Translation status of a single chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    #[default]
    Pending,
    Translating,
    Completed,
}

/// Book genre, as reported by the inference service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    #[default]
    Fiction,
    Novel,
    Romance,
    Fantasy,
    SciFi,
    SelfHelp,
    Psychology,
    Business,
    Academic,
    Religious,
    Biography,
    History,
    Children,
}

impl Genre {
    pub const ALL: [Genre; 13] = [
        Genre::Fiction,
        Genre::Novel,
        Genre::Romance,
        Genre::Fantasy,
        Genre::SciFi,
        Genre::SelfHelp,
        Genre::Psychology,
        Genre::Business,
        Genre::Academic,
        Genre::Religious,
        Genre::Biography,
        Genre::History,
        Genre::Children,
    ];

    /// The literal used in prompts and in the persisted record.
    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Fiction => "fiction",
            Genre::Novel => "novel",
            Genre::Romance => "romance",
            Genre::Fantasy => "fantasy",
            Genre::SciFi => "sci-fi",
            Genre::SelfHelp => "self-help",
            Genre::Psychology => "psychology",
            Genre::Business => "business",
            Genre::Academic => "academic",
            Genre::Religious => "religious",
            Genre::Biography => "biography",
            Genre::History => "history",
            Genre::Children => "children",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse: model output is free text, so unknown values become fiction.
impl std::str::FromStr for Genre {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
        let genre = match normalized.as_str() {
            "scifi" | "science-fiction" => Genre::SciFi,
            "selfhelp" => Genre::SelfHelp,
            other => Genre::ALL
                .into_iter()
                .find(|g| g.as_str() == other)
                .unwrap_or_default(),
        };
        Ok(genre)
    }
}

/// Metadata inferred once at ingestion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub detected_language: String,
    pub genre: Genre,
    pub summary: String,
}

/// A titled segment of source text and its translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub original_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(default)]
    pub status: ChapterStatus,
}

impl Chapter {
    /// Create a pending chapter at the given position.
    pub fn new(index: usize, title: impl Into<String>, original_text: impl Into<String>) -> Self {
        Self {
            id: format!("ch-{}", index),
            title: title.into(),
            original_text: original_text.into(),
            translated_text: None,
            status: ChapterStatus::Pending,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ChapterStatus::Completed
    }

    /// True when the original text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.original_text.trim().is_empty()
    }
}

/// The unit of work: one uploaded book, its metadata and its chapters.
///
/// Progress is derived from chapter statuses on every read. A `progress`
/// key left in an older record is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationProject {
    pub id: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BookMetadata>,
    pub chapters: Vec<Chapter>,
}

impl TranslationProject {
    pub fn new(
        file_name: impl Into<String>,
        metadata: Option<BookMetadata>,
        chapters: Vec<Chapter>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            file_name: file_name.into(),
            metadata,
            chapters,
        }
    }

    /// Percentage of completed chapters, 0 to 100.
    pub fn progress(&self) -> u8 {
        progress_percent(self.completed_count(), self.chapters.len())
    }

    pub fn completed_count(&self) -> usize {
        self.chapters.iter().filter(|c| c.is_completed()).count()
    }

    /// The chapter currently being translated, if any.
    pub fn translating_chapter(&self) -> Option<&Chapter> {
        self.chapters
            .iter()
            .find(|c| c.status == ChapterStatus::Translating)
    }

    /// Book title from metadata, if known.
    pub fn title(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.title.as_str())
    }

    /// Genre used for translation prompts.
    pub fn genre(&self) -> Genre {
        self.metadata.as_ref().map(|m| m.genre).unwrap_or_default()
    }

    /// Context string passed alongside each chapter to the translator.
    pub fn translation_context(&self) -> String {
        match &self.metadata {
            Some(meta) => format!("Book: {} by {}", meta.title, meta.author),
            None => format!("Book: {}", self.file_name),
        }
    }

    /// Bring a freshly loaded record back to a consistent state.
    ///
    /// A chapter left in `translating` belongs to a session that ended
    /// mid-request, so it goes back to `pending`.
    pub fn normalize(&mut self) {
        for chapter in &mut self.chapters {
            if chapter.status == ChapterStatus::Translating {
                chapter.status = ChapterStatus::Pending;
            }
        }
    }
}

/// `round(100 * completed / total)`, with halves rounding up.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((200 * completed + total) / (2 * total)) as u8
}
