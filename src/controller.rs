//! Project state controller.
//!
//! Owns the single active `TranslationProject`, the selected chapter, and the
//! per-chapter translation state machine:
//!
//! ```text
//! pending --translate--> translating --ok--> completed
//!                             |
//!                             +--error--> pending
//! ```
//!
//! Persistence and the remote service are injected, so the whole flow runs
//! against in-memory fakes in tests.

use crate::error::{IngestError, InputError, ServiceError, TranslateError};
use crate::models::{Chapter, ChapterStatus, TranslationProject};
use crate::service::{BookService, ChapterDraft};
use crate::store::ProjectStore;
use crate::utils::char_prefix;
use std::path::Path;

/// Characters kept in the single-chapter fallback.
pub const FALLBACK_CHAPTER_CHARS: usize = 10_000;

/// Title of the single-chapter fallback ("whole text").
pub const FALLBACK_CHAPTER_TITLE: &str = "Barcha matn";

/// File extensions the upload hints at. Others are accepted with a warning.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Why a translate request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoProject,
    AlreadyCompleted,
}

/// Result of `translate_active_chapter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateOutcome {
    /// The chapter was translated. Carries the new project progress and
    /// whether the updated project reached the store.
    Completed { progress: u8, saved: bool },
    /// Nothing to do.
    Skipped(SkipReason),
}

/// Drives ingestion, chapter selection, translation and saving.
pub struct ProjectController<S, P> {
    service: S,
    store: P,
    project: Option<TranslationProject>,
    active_index: usize,
}

impl<S: BookService, P: ProjectStore> ProjectController<S, P> {
    /// Create a controller with no project loaded.
    pub fn new(service: S, store: P) -> Self {
        Self {
            service,
            store,
            project: None,
            active_index: 0,
        }
    }

    /// Create a controller and restore the last saved project, if any.
    pub fn open(service: S, store: P) -> Self {
        let mut controller = Self::new(service, store);
        controller.restore();
        controller
    }

    /// Load the persisted project. A missing or malformed record means no project.
    pub fn restore(&mut self) -> bool {
        match self.store.load() {
            Ok(Some(mut project)) => {
                project.normalize();
                if project.chapters.is_empty() {
                    tracing::warn!("saved project has no chapters, ignoring it");
                    return false;
                }
                tracing::info!(id = %project.id, chapters = project.chapters.len(), "restored saved project");
                self.project = Some(project);
                self.active_index = 0;
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::error!("Failed to load saved project: {}", e);
                false
            }
        }
    }

    pub fn project(&self) -> Option<&TranslationProject> {
        self.project.as_ref()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// The chapter shown in the reader.
    pub fn active_chapter(&self) -> Option<&Chapter> {
        self.project
            .as_ref()
            .and_then(|p| p.chapters.get(self.active_index))
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    /// Read a text file from disk and ingest it.
    pub async fn ingest_file(&mut self, path: &Path) -> Result<&TranslationProject, IngestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        if !extension
            .as_deref()
            .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e))
        {
            tracing::warn!(path = %path.display(), "file extension is not a plain-text hint, reading anyway");
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| InputError::Unreadable {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.ingest(&file_name, &content).await
    }

    /// Build a new project from raw text, replacing the current one.
    ///
    /// Both remote calls must succeed; on any error the current project is kept.
    pub async fn ingest(
        &mut self,
        file_name: &str,
        content: &str,
    ) -> Result<&TranslationProject, IngestError> {
        if content.trim().is_empty() {
            return Err(InputError::EmptyFile.into());
        }

        let metadata = self.service.analyze_metadata(content).await?;
        let drafts = self.service.split_into_chapters(content).await?;
        tracing::info!(
            title = %metadata.title,
            segments = drafts.len(),
            "book analyzed"
        );

        let chapters = build_chapters(drafts, content)?;
        let project = TranslationProject::new(file_name, Some(metadata), chapters);

        self.persist(&project);
        self.active_index = 0;
        Ok(&*self.project.insert(project))
    }

    /// Change which chapter is displayed.
    pub fn select_chapter(&mut self, index: usize) -> Result<(), InputError> {
        let project = self.project.as_ref().ok_or(InputError::NoProject)?;
        if index >= project.chapters.len() {
            return Err(InputError::ChapterOutOfRange {
                index,
                total: project.chapters.len(),
            });
        }
        self.active_index = index;
        Ok(())
    }

    /// Translate the selected chapter.
    pub async fn translate_active_chapter(&mut self) -> Result<TranslateOutcome, TranslateError> {
        let index = self.active_index;
        let Some(project) = self.project.as_mut() else {
            return Ok(TranslateOutcome::Skipped(SkipReason::NoProject));
        };

        if let Some(busy) = project.translating_chapter() {
            return Err(TranslateError::Busy {
                title: busy.title.clone(),
            });
        }

        let genre = project.genre();
        let context = project.translation_context();
        let total = project.chapters.len();
        let chapter = project
            .chapters
            .get_mut(index)
            .ok_or(InputError::ChapterOutOfRange { index, total })?;

        if chapter.is_completed() {
            return Ok(TranslateOutcome::Skipped(SkipReason::AlreadyCompleted));
        }
        if chapter.is_blank() {
            return Err(InputError::EmptyChapter.into());
        }

        chapter.status = ChapterStatus::Translating;
        let text = chapter.original_text.clone();
        tracing::info!(chapter = %chapter.title, chars = text.chars().count(), "translating chapter");

        let result = self.service.translate_chapter(&text, genre, &context).await;
        self.finish_translation(index, result)
    }

    fn finish_translation(
        &mut self,
        index: usize,
        result: Result<String, ServiceError>,
    ) -> Result<TranslateOutcome, TranslateError> {
        let Some(project) = self.project.as_mut() else {
            return Ok(TranslateOutcome::Skipped(SkipReason::NoProject));
        };
        let chapter = &mut project.chapters[index];

        match result {
            Ok(translated) => {
                chapter.translated_text = Some(translated);
                chapter.status = ChapterStatus::Completed;
                let progress = project.progress();
                tracing::info!(progress, "chapter translated");

                let snapshot = project.clone();
                let saved = self.persist(&snapshot);
                Ok(TranslateOutcome::Completed { progress, saved })
            }
            Err(e) => {
                tracing::error!(chapter = %chapter.title, "Translation error: {}", e);
                chapter.status = ChapterStatus::Pending;
                Err(e.into())
            }
        }
    }

    /// Close the project and drop its saved record. Needs explicit confirmation.
    pub fn reset(&mut self, confirmed: bool) -> bool {
        if !confirmed {
            return false;
        }

        self.project = None;
        self.active_index = 0;
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear saved project: {}", e);
        }
        true
    }

    /// Persist the current snapshot, changed or not. Returns false if nothing was written.
    pub fn save(&self) -> bool {
        match &self.project {
            Some(project) => self.persist(project),
            None => false,
        }
    }

    /// Timer-driven save; identical to `save`.
    pub fn autosave(&self) -> bool {
        let saved = self.save();
        if saved {
            tracing::debug!("autosave complete");
        }
        saved
    }

    /// Write the project; errors are logged and otherwise ignored.
    fn persist(&self, project: &TranslationProject) -> bool {
        match self.store.save(project) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Auto-save failed (likely quota limit): {}", e);
                false
            }
        }
    }
}

/// Turn segmentation output into validated chapters.
///
/// An empty segmentation becomes one fallback chapter with the start of the
/// text. Blank chapters are dropped; failing if none survive.
fn build_chapters(drafts: Vec<ChapterDraft>, content: &str) -> Result<Vec<Chapter>, InputError> {
    let drafts = if drafts.is_empty() {
        vec![ChapterDraft::new(
            FALLBACK_CHAPTER_TITLE,
            char_prefix(content, FALLBACK_CHAPTER_CHARS),
        )]
    } else {
        drafts
    };

    let chapters: Vec<Chapter> = drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| {
            let title = if draft.title.trim().is_empty() {
                format!("Bob {}", i + 1)
            } else {
                draft.title.trim().to_string()
            };
            Chapter::new(i, title, draft.content)
        })
        .filter(|c| !c.is_blank())
        .collect();

    if chapters.is_empty() {
        return Err(InputError::NoUsableChapters);
    }
    Ok(chapters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookMetadata, Genre};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Deterministic stand-in for the remote service.
    #[derive(Default)]
    struct FakeService {
        chapters: Vec<ChapterDraft>,
        fail_analyze: bool,
        fail_split: bool,
        fail_translate: Mutex<bool>,
        calls: Mutex<Vec<(String, Genre, String)>>,
    }

    impl FakeService {
        fn with_chapters(chapters: Vec<ChapterDraft>) -> Self {
            Self {
                chapters,
                ..Default::default()
            }
        }

        fn set_translate_failure(&self, fail: bool) {
            *self.fail_translate.lock().unwrap() = fail;
        }
    }

    #[async_trait]
    impl BookService for FakeService {
        async fn analyze_metadata(&self, _sample: &str) -> Result<BookMetadata, ServiceError> {
            if self.fail_analyze {
                return Err(ServiceError::ApiError("HTTP 500: analyze down".to_string()));
            }
            Ok(BookMetadata {
                title: "Kichik shahzoda".to_string(),
                author: "Exupéry".to_string(),
                detected_language: "French".to_string(),
                genre: Genre::Children,
                summary: "A prince.".to_string(),
            })
        }

        async fn split_into_chapters(
            &self,
            _text: &str,
        ) -> Result<Vec<ChapterDraft>, ServiceError> {
            if self.fail_split {
                return Err(ServiceError::ApiError("HTTP 500: split down".to_string()));
            }
            Ok(self.chapters.clone())
        }

        async fn translate_chapter(
            &self,
            text: &str,
            genre: Genre,
            context: &str,
        ) -> Result<String, ServiceError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), genre, context.to_string()));
            if *self.fail_translate.lock().unwrap() {
                return Err(ServiceError::ApiError("HTTP 429: quota".to_string()));
            }
            Ok(format!("UZ: {}", text))
        }
    }

    fn three_chapters() -> Vec<ChapterDraft> {
        vec![
            ChapterDraft::new("One", "First chapter."),
            ChapterDraft::new("Two", "Second chapter."),
            ChapterDraft::new("Three", "Third chapter."),
        ]
    }

    fn controller(service: FakeService) -> ProjectController<FakeService, MemoryStore> {
        ProjectController::new(service, MemoryStore::new())
    }

    #[tokio::test]
    async fn test_ingest_builds_project() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        let project = ctl.ingest("book.txt", "some book text").await.unwrap();

        assert_eq!(project.file_name, "book.txt");
        assert_eq!(project.chapters.len(), 3);
        assert_eq!(project.progress(), 0);
        assert_eq!(project.chapters[1].id, "ch-1");
        assert!(
            project
                .chapters
                .iter()
                .all(|c| c.status == ChapterStatus::Pending)
        );
        assert_eq!(ctl.store().load().unwrap().unwrap().chapters.len(), 3);
    }

    #[tokio::test]
    async fn test_ingest_empty_file_creates_nothing() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        let err = ctl.ingest("empty.txt", "  \n\t ").await.unwrap_err();

        assert!(matches!(err, IngestError::Input(InputError::EmptyFile)));
        assert!(ctl.project().is_none());
        assert!(ctl.store().raw().is_none());
    }

    #[tokio::test]
    async fn test_ingest_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shahzoda.txt");
        std::fs::write(&path, "Chapter One\nOnce upon a time.").unwrap();

        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        let project = ctl.ingest_file(&path).await.unwrap();

        assert_eq!(project.file_name, "shahzoda.txt");
        assert_eq!(project.chapters.len(), 3);
    }

    #[tokio::test]
    async fn test_ingest_file_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let binary = dir.path().join("cover.bin");
        std::fs::write(&binary, [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        for path in [missing, binary] {
            let err = ctl.ingest_file(&path).await.unwrap_err();
            assert!(matches!(
                err,
                IngestError::Input(InputError::Unreadable { .. })
            ));
        }
        assert!(ctl.project().is_none());
    }

    #[tokio::test]
    async fn test_ingest_fallback_single_chapter() {
        let mut ctl = controller(FakeService::default());
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let project = ctl.ingest("plain.txt", text).await.unwrap();

        assert_eq!(project.chapters.len(), 1);
        assert_eq!(project.chapters[0].title, FALLBACK_CHAPTER_TITLE);
        assert_eq!(project.chapters[0].original_text, text);
        assert_eq!(project.chapters[0].status, ChapterStatus::Pending);
    }

    #[tokio::test]
    async fn test_ingest_fallback_truncates_to_limit() {
        let mut ctl = controller(FakeService::default());
        let text = "ab".repeat(FALLBACK_CHAPTER_CHARS);
        let project = ctl.ingest("long.txt", &text).await.unwrap();

        assert_eq!(
            project.chapters[0].original_text.chars().count(),
            FALLBACK_CHAPTER_CHARS
        );
        assert!(text.starts_with(&project.chapters[0].original_text));
    }

    #[tokio::test]
    async fn test_ingest_filters_blank_chapters() {
        let mut ctl = controller(FakeService::with_chapters(vec![
            ChapterDraft::new("Blank", "   \n  "),
            ChapterDraft::new("", "Real content."),
            ChapterDraft::new("Empty", ""),
        ]));
        let project = ctl.ingest("book.txt", "text").await.unwrap();

        assert_eq!(project.chapters.len(), 1);
        assert_eq!(project.chapters[0].title, "Bob 2");
        assert!(project.chapters.iter().all(|c| !c.is_blank()));
    }

    #[tokio::test]
    async fn test_ingest_fails_when_all_chapters_blank() {
        let mut ctl = controller(FakeService::with_chapters(vec![
            ChapterDraft::new("A", " "),
            ChapterDraft::new("B", "\n"),
        ]));
        let err = ctl.ingest("book.txt", "text").await.unwrap_err();

        assert!(matches!(
            err,
            IngestError::Input(InputError::NoUsableChapters)
        ));
        assert!(ctl.project().is_none());
        assert!(ctl.store().raw().is_none());
    }

    #[tokio::test]
    async fn test_ingest_is_all_or_nothing() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        ctl.ingest("first.txt", "text").await.unwrap();

        ctl.service.fail_split = true;
        let err = ctl.ingest("second.txt", "more text").await.unwrap_err();
        assert!(matches!(err, IngestError::Service(_)));
        assert_eq!(ctl.project().unwrap().file_name, "first.txt");

        ctl.service.fail_split = false;
        ctl.service.fail_analyze = true;
        assert!(ctl.ingest("third.txt", "text").await.is_err());
        assert_eq!(ctl.project().unwrap().file_name, "first.txt");
    }

    #[tokio::test]
    async fn test_ingest_replaces_project_and_resets_selection() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        ctl.ingest("first.txt", "text").await.unwrap();
        let first_id = ctl.project().unwrap().id.clone();
        ctl.select_chapter(2).unwrap();

        ctl.ingest("second.txt", "text").await.unwrap();
        assert_ne!(ctl.project().unwrap().id, first_id);
        assert_eq!(ctl.active_index(), 0);
    }

    #[tokio::test]
    async fn test_select_chapter() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        assert_eq!(ctl.select_chapter(0), Err(InputError::NoProject));

        ctl.ingest("book.txt", "text").await.unwrap();
        ctl.select_chapter(2).unwrap();
        assert_eq!(ctl.active_chapter().unwrap().title, "Three");

        assert_eq!(
            ctl.select_chapter(3),
            Err(InputError::ChapterOutOfRange { index: 3, total: 3 })
        );
        assert_eq!(ctl.active_index(), 2);
    }

    #[tokio::test]
    async fn test_translate_success_updates_progress_and_persists() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        ctl.ingest("book.txt", "text").await.unwrap();
        ctl.select_chapter(1).unwrap();

        let outcome = ctl.translate_active_chapter().await.unwrap();
        assert_eq!(
            outcome,
            TranslateOutcome::Completed {
                progress: 33,
                saved: true
            }
        );

        let chapter = ctl.active_chapter().unwrap();
        assert_eq!(chapter.status, ChapterStatus::Completed);
        assert_eq!(
            chapter.translated_text.as_deref(),
            Some("UZ: Second chapter.")
        );

        let saved = ctl.store().load().unwrap().unwrap();
        assert_eq!(saved.chapters[1].status, ChapterStatus::Completed);
        assert_eq!(saved.progress(), 33);

        let calls = ctl.service.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            (
                "Second chapter.".to_string(),
                Genre::Children,
                "Book: Kichik shahzoda by Exupéry".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_progress_after_each_completion() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        ctl.ingest("book.txt", "text").await.unwrap();

        let mut seen = Vec::new();
        for i in 0..3 {
            ctl.select_chapter(i).unwrap();
            if let TranslateOutcome::Completed { progress, .. } =
                ctl.translate_active_chapter().await.unwrap()
            {
                seen.push(progress);
            }
        }
        assert_eq!(seen, vec![33, 67, 100]);
    }

    #[tokio::test]
    async fn test_translate_failure_reverts_to_pending() {
        let service = FakeService::with_chapters(three_chapters());
        service.set_translate_failure(true);
        let mut ctl = controller(service);
        ctl.ingest("book.txt", "text").await.unwrap();
        let saved_before = ctl.store().raw();

        let err = ctl.translate_active_chapter().await.unwrap_err();
        assert!(matches!(err, TranslateError::Service(_)));
        assert!(err.to_string().contains("quota"));

        let chapter = ctl.active_chapter().unwrap();
        assert_eq!(chapter.status, ChapterStatus::Pending);
        assert!(chapter.translated_text.is_none());
        assert_eq!(ctl.project().unwrap().progress(), 0);
        assert_eq!(ctl.store().raw(), saved_before);

        // A manual retry works once the service recovers.
        ctl.service.set_translate_failure(false);
        assert!(matches!(
            ctl.translate_active_chapter().await.unwrap(),
            TranslateOutcome::Completed { .. }
        ));
    }

    #[tokio::test]
    async fn test_translate_noops() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        assert_eq!(
            ctl.translate_active_chapter().await.unwrap(),
            TranslateOutcome::Skipped(SkipReason::NoProject)
        );

        ctl.ingest("book.txt", "text").await.unwrap();
        ctl.translate_active_chapter().await.unwrap();
        assert_eq!(
            ctl.translate_active_chapter().await.unwrap(),
            TranslateOutcome::Skipped(SkipReason::AlreadyCompleted)
        );
        assert_eq!(ctl.service.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_translate_blank_chapter_warns() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        ctl.ingest("book.txt", "text").await.unwrap();
        ctl.project.as_mut().unwrap().chapters[0].original_text = "   ".to_string();

        let err = ctl.translate_active_chapter().await.unwrap_err();
        assert!(matches!(err, TranslateError::Input(InputError::EmptyChapter)));
        assert_eq!(ctl.active_chapter().unwrap().status, ChapterStatus::Pending);
        assert!(ctl.service.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_translate_busy_guard() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        ctl.ingest("book.txt", "text").await.unwrap();
        ctl.project.as_mut().unwrap().chapters[2].status = ChapterStatus::Translating;

        let err = ctl.translate_active_chapter().await.unwrap_err();
        assert!(matches!(err, TranslateError::Busy { ref title } if title == "Three"));
        assert!(ctl.service.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_requires_confirmation() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        ctl.ingest("book.txt", "text").await.unwrap();

        assert!(!ctl.reset(false));
        assert!(ctl.project().is_some());
        assert!(ctl.store().raw().is_some());

        assert!(ctl.reset(true));
        assert!(ctl.project().is_none());
        assert!(ctl.store().raw().is_none());
    }

    #[tokio::test]
    async fn test_save_and_restore_round_trip() {
        let mut ctl = controller(FakeService::with_chapters(three_chapters()));
        ctl.ingest("book.txt", "text").await.unwrap();
        ctl.translate_active_chapter().await.unwrap();
        let before = ctl.project().unwrap().clone();
        assert!(ctl.autosave());

        let raw = ctl.store().raw().unwrap();
        let store = MemoryStore::new();
        store.put_raw(raw);
        let reopened = ProjectController::open(FakeService::default(), store);

        let after = reopened.project().unwrap();
        assert_eq!(after, &before);
        assert_eq!(after.chapters[0].status, ChapterStatus::Completed);
        assert_eq!(after.chapters[0].translated_text, before.chapters[0].translated_text);
    }

    #[test]
    fn test_restore_malformed_record_loads_nothing() {
        let store = MemoryStore::new();
        store.put_raw("{\"id\": 42, truncated");
        let ctl = ProjectController::open(FakeService::default(), store);
        assert!(ctl.project().is_none());
    }

    #[tokio::test]
    async fn test_save_failure_does_not_block_work() {
        let mut ctl = ProjectController::new(
            FakeService::with_chapters(three_chapters()),
            MemoryStore::with_quota(16),
        );
        ctl.ingest("book.txt", "text").await.unwrap();
        assert!(ctl.project().is_some());
        assert!(!ctl.save());

        let outcome = ctl.translate_active_chapter().await.unwrap();
        assert_eq!(
            outcome,
            TranslateOutcome::Completed {
                progress: 33,
                saved: false
            }
        );
        assert_eq!(
            ctl.active_chapter().unwrap().status,
            ChapterStatus::Completed
        );
    }

    #[test]
    fn test_autosave_without_project() {
        let ctl = controller(FakeService::default());
        assert!(!ctl.autosave());
        assert!(ctl.store().raw().is_none());
    }
}
