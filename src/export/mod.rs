//! PDF and DOCX export of translated chapters.
//!
//! Only completed chapters are exported. Rendering happens in memory first,
//! so a failed export never leaves a partial file behind.

mod docx;
mod pdf;

pub use docx::render_docx;
pub use pdf::render_pdf;

use crate::error::ExportError;
use crate::models::TranslationProject;
use crate::utils::sanitize_file_name;
use std::fmt;
use std::path::{Path, PathBuf};

/// Suffix appended to exported file names.
pub const EXPORT_SUFFIX: &str = "_Uzbek";

/// Title used when the project has no metadata.
const FALLBACK_TITLE: &str = "Translated Book";

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Docx => "DOCX",
        })
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" | "word" => Ok(ExportFormat::Docx),
            other => Err(format!("Unknown export format '{}' (use pdf or docx)", other)),
        }
    }
}

/// One exported chapter: heading and translated body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportChapter<'a> {
    pub title: &'a str,
    pub body: &'a str,
}

/// Everything a renderer needs: front matter plus completed chapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub chapters: Vec<ExportChapter<'a>>,
}

impl<'a> ExportDocument<'a> {
    pub fn from_project(project: &'a TranslationProject) -> Self {
        let (title, author) = match &project.metadata {
            Some(meta) => (meta.title.as_str(), meta.author.as_str()),
            None => (FALLBACK_TITLE, ""),
        };

        let chapters = project
            .chapters
            .iter()
            .filter(|c| c.is_completed())
            .map(|c| ExportChapter {
                title: c.title.as_str(),
                body: c.translated_text.as_deref().unwrap_or_default(),
            })
            .collect();

        Self {
            title,
            author,
            chapters,
        }
    }
}

/// `<title>_Uzbek.<ext>`, with "Book" standing in for a missing title.
pub fn export_file_name(project: &TranslationProject, format: ExportFormat) -> String {
    let title = project
        .title()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("Book");
    format!(
        "{}{}.{}",
        sanitize_file_name(title),
        EXPORT_SUFFIX,
        format.extension()
    )
}

/// Render the project in the given format.
pub fn render(project: &TranslationProject, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    let document = ExportDocument::from_project(project);
    match format {
        ExportFormat::Pdf => render_pdf(&document),
        ExportFormat::Docx => render_docx(&document),
    }
}

/// Render and write the export into `dir`, returning the written path.
pub fn write_export(
    project: &TranslationProject,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let bytes = render(project, format)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(project, format));
    std::fs::write(&path, bytes)?;

    tracing::info!(path = %path.display(), %format, "export written");
    Ok(path)
}
