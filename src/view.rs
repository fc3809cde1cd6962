//! Text views for the interactive shell.
//!
//! Pure functions from project state to strings; the shell decides where to
//! print them.

use crate::console::{Console, Style};
use crate::models::{Chapter, ChapterStatus, TranslationProject};
use crate::utils::wrap_text;

const PLACEHOLDER_TRANSLATING: &str = "Translating into Uzbek...";
const PLACEHOLDER_EMPTY: &str = "Translation will appear here...";

/// `[#####-----] 50%`
pub fn progress_bar(percent: u8, width: usize) -> String {
    let percent = percent.min(100) as usize;
    let filled = (percent * width + 50) / 100;
    format!(
        "[{}{}] {}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent
    )
}

fn status_marker(status: ChapterStatus) -> &'static str {
    match status {
        ChapterStatus::Pending => " ",
        ChapterStatus::Translating => "~",
        ChapterStatus::Completed => "✓",
    }
}

/// Project summary: title, author, genre, language and progress.
pub fn project_header(console: &Console, project: &TranslationProject) -> String {
    let mut out = String::new();

    match &project.metadata {
        Some(meta) => {
            out.push_str(&console.style(&meta.title, &[Style::Bold]));
            out.push_str(&format!(" by {}\n", meta.author));
            out.push_str(&console.muted(&format!(
                "{} | {} | {}",
                meta.genre.as_str().to_uppercase(),
                meta.detected_language,
                project.file_name
            )));
            out.push('\n');
        }
        None => {
            out.push_str(&console.style(&project.file_name, &[Style::Bold]));
            out.push('\n');
        }
    }

    out.push_str(&format!(
        "{} translated, {}/{} chapters ready",
        progress_bar(project.progress(), 20),
        project.completed_count(),
        project.chapters.len()
    ));
    out
}

/// Numbered chapter list with status markers; the active one is highlighted.
pub fn chapter_list(console: &Console, project: &TranslationProject, active: usize) -> String {
    project
        .chapters
        .iter()
        .enumerate()
        .map(|(i, chapter)| {
            let line = format!(
                "{} {:>3}. {}",
                status_marker(chapter.status),
                i + 1,
                chapter.title
            );
            if i == active {
                console.style(&format!("> {}", line), &[Style::Cyan, Style::Bold])
            } else {
                format!("  {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// Side-by-side original and translated text, each column `column_width` wide.
pub fn reader(chapter: &Chapter, column_width: usize) -> String {
    let right_text = match (chapter.status, chapter.translated_text.as_deref()) {
        (ChapterStatus::Translating, _) => PLACEHOLDER_TRANSLATING,
        (_, Some(text)) => text,
        (_, None) => PLACEHOLDER_EMPTY,
    };

    let left = wrap_text(&chapter.original_text, column_width);
    let right = wrap_text(right_text, column_width);
    let rows = left.len().max(right.len());

    let mut out = vec![
        format!("== {} ==", chapter.title),
        format!(
            "{} | {}",
            pad("ORIGINAL TEXT", column_width),
            "O'ZBEKCHA TARJIMA"
        ),
        format!("{}-+-{}", "-".repeat(column_width), "-".repeat(column_width)),
    ];

    for row in 0..rows {
        let l = left.get(row).map(String::as_str).unwrap_or("");
        let r = right.get(row).map(String::as_str).unwrap_or("");
        out.push(format!("{} | {}", pad(l, column_width), r).trim_end().to_string());
    }

    out.join("\n")
}
