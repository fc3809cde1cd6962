//! UzTrans CLI - interactive book translation shell.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::MissedTickBehavior;
use uztrans::config::Config;
use uztrans::console::Console;
use uztrans::controller::{ProjectController, SkipReason, TranslateOutcome};
use uztrans::error::{IngestError, TranslateError};
use uztrans::export::{self, ExportFormat};
use uztrans::llm::LlmClient;
use uztrans::store::FileStore;
use uztrans::{logging, view};

/// Width of each reader column, in characters.
const READER_COLUMN_WIDTH: usize = 48;

const HELP: &str = "\
Commands:
  open <path>          Load a text file and detect its chapters
  chapters             List chapters and their status
  select <n>           Show chapter n (1-based)
  translate            Translate the selected chapter into Uzbek
  show                 Show the selected chapter side by side
  info                 Show book details and progress
  export pdf|docx      Export completed chapters
  save                 Save the project now
  reset                Close the project and delete its saved copy
  help                 Show this help
  quit                 Exit";

/// Book translation assistant: LLM-assisted chapter-by-chapter translation into Uzbek.
#[derive(Parser, Debug)]
#[command(name = "uztrans")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Text file to load on startup (replaces any saved project).
    file: Option<PathBuf>,

    /// Use this config file instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for exported files (overrides config).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

/// A parsed shell command.
#[derive(Debug, PartialEq)]
enum Command {
    Open(PathBuf),
    Chapters,
    Select(usize),
    Translate,
    Show,
    Info,
    Export(ExportFormat),
    Save,
    Reset,
    Help,
    Quit,
    Empty,
}

impl Command {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "" => Command::Empty,
            "open" | "upload" => {
                if arg.is_empty() {
                    return Err("Usage: open <path>".to_string());
                }
                Command::Open(PathBuf::from(arg))
            }
            "chapters" | "ls" => Command::Chapters,
            "select" | "go" => {
                let n: usize = arg
                    .parse()
                    .map_err(|_| "Usage: select <chapter number>".to_string())?;
                if n == 0 {
                    return Err("Chapter numbers start at 1".to_string());
                }
                Command::Select(n - 1)
            }
            "translate" | "t" => Command::Translate,
            "show" | "read" => Command::Show,
            "info" => Command::Info,
            "export" => Command::Export(arg.parse()?),
            "save" => Command::Save,
            "reset" | "close" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
        };
        Ok(command)
    }
}

type Controller = ProjectController<LlmClient, FileStore>;

/// Shell state that lives outside the controller.
struct Shell {
    console: Console,
    controller: Controller,
    output_dir: PathBuf,
    last_saved: Option<String>,
}

fn clock_time() -> Option<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!("[hour]:[minute]")).ok()
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "ha")
}

impl Shell {
    fn mark_saved(&mut self, saved: bool) {
        if saved {
            self.last_saved = clock_time();
        }
    }

    fn print_info(&self) {
        match self.controller.project() {
            Some(project) => {
                self.console
                    .block(&view::project_header(&self.console, project));
                if let Some(time) = &self.last_saved {
                    self.console.block(&self.console.saved_badge(time));
                }
                if let Some(summary) = project.metadata.as_ref().map(|m| &m.summary) {
                    if !summary.is_empty() {
                        self.console.block(&self.console.muted(summary));
                    }
                }
            }
            None => self.console.info("No project loaded. Use 'open <path>'."),
        }
    }

    fn print_chapters(&self) {
        match self.controller.project() {
            Some(project) => self.console.block(&view::chapter_list(
                &self.console,
                project,
                self.controller.active_index(),
            )),
            None => self.console.info("No project loaded. Use 'open <path>'."),
        }
    }

    fn print_reader(&self) {
        match self.controller.active_chapter() {
            Some(chapter) => self
                .console
                .block(&view::reader(chapter, READER_COLUMN_WIDTH)),
            None => self.console.info("No project loaded. Use 'open <path>'."),
        }
    }

    async fn open(&mut self, path: &Path) {
        self.console
            .step(&format!("Analyzing {} ...", path.display()));

        match self.controller.ingest_file(path).await {
            Ok(project) => {
                let chapters = project.chapters.len();
                let title = project.title().unwrap_or_default().to_string();
                self.console
                    .success(&format!("Loaded '{}' with {} chapters", title, chapters));
                let saved = self.controller.save();
                self.mark_saved(saved);
                self.print_info();
                self.print_chapters();
            }
            Err(IngestError::Input(e)) => self.console.warning(&e.to_string()),
            Err(e) => self.console.error(&format!("Something went wrong: {}", e)),
        }
    }

    async fn translate(&mut self) {
        if let Some(chapter) = self.controller.active_chapter() {
            if !chapter.is_completed() && !chapter.is_blank() {
                self.console
                    .step(&format!("Translating '{}' ...", chapter.title));
            }
        }

        match self.controller.translate_active_chapter().await {
            Ok(TranslateOutcome::Completed { progress, saved }) => {
                self.mark_saved(saved);
                self.console
                    .success(&format!("Chapter translated. {}", view::progress_bar(progress, 20)));
                if !saved {
                    self.console
                        .warning("Could not save the project; it stays open in memory.");
                }
                self.print_reader();
            }
            Ok(TranslateOutcome::Skipped(SkipReason::NoProject)) => {
                self.console.info("No project loaded. Use 'open <path>'.")
            }
            Ok(TranslateOutcome::Skipped(SkipReason::AlreadyCompleted)) => {
                self.console.info("This chapter is already translated.")
            }
            Err(TranslateError::Service(e)) => self.console.error(&format!(
                "Translation stopped: {}. Please try again.",
                e
            )),
            Err(e) => self.console.warning(&e.to_string()),
        }
    }

    fn export(&self, format: ExportFormat) {
        let Some(project) = self.controller.project() else {
            self.console.info("No project loaded. Use 'open <path>'.");
            return;
        };
        if project.completed_count() == 0 {
            self.console
                .warning("No chapters are translated yet; the file will only have the title page.");
        }

        match export::write_export(project, format, &self.output_dir) {
            Ok(path) => self
                .console
                .success(&format!("{} saved to {}", format, path.display())),
            Err(e) => {
                tracing::error!("Export failed: {}", e);
                self.console.error("Export failed.");
            }
        }
    }

    /// Returns false when the shell should exit.
    async fn run_command(&mut self, command: Command, lines: &mut Lines<BufReader<Stdin>>) -> Result<bool> {
        match command {
            Command::Empty => {}
            Command::Open(path) => self.open(&path).await,
            Command::Chapters => self.print_chapters(),
            Command::Select(index) => match self.controller.select_chapter(index) {
                Ok(()) => self.print_reader(),
                Err(e) => self.console.warning(&e.to_string()),
            },
            Command::Translate => self.translate().await,
            Command::Show => self.print_reader(),
            Command::Info => self.print_info(),
            Command::Export(format) => self.export(format),
            Command::Save => {
                if self.controller.project().is_none() {
                    self.console.info("Nothing to save.");
                } else if self.controller.save() {
                    self.mark_saved(true);
                    self.console.success("Project saved");
                } else {
                    self.console
                        .warning("Could not save the project; it stays open in memory.");
                }
            }
            Command::Reset => {
                if self.controller.project().is_none() {
                    self.console.info("No project loaded.");
                    return Ok(true);
                }
                self.console
                    .prompt("Close the project? Unsaved changes may be lost. [y/N]");
                let answer = lines.next_line().await?.unwrap_or_default();
                if self.controller.reset(is_yes(&answer)) {
                    self.last_saved = None;
                    self.console.success("Project closed");
                } else {
                    self.console.info("Kept the project open");
                }
            }
            Command::Help => self.console.block(HELP),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);
    let console = Console::new();

    console.section("UzTrans - Book Translation Assistant");

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    if !config.api.is_configured() {
        let config_path = match &args.config {
            Some(path) => path.clone(),
            None => Config::config_path()?,
        };
        console.warning(&format!(
            "API key not configured. Please edit: {}",
            config_path.display()
        ));
        console.info("Set your OpenAI-compatible API key in the config file and run again.");
        return Ok(());
    }
    config.validate().context("Invalid configuration")?;

    let data_dir = config.data_dir()?;
    let store = FileStore::new(&data_dir).with_quota(config.storage.max_bytes);
    let service = LlmClient::new(config.api.clone(), config.prompts.clone());
    let controller = ProjectController::open(service, store);

    let mut shell = Shell {
        console: console.clone(),
        controller,
        output_dir: args
            .output_dir
            .clone()
            .unwrap_or_else(|| config.paths.output_directory.clone()),
        last_saved: None,
    };

    if shell.controller.project().is_some() {
        shell.last_saved = clock_time();
        console.success("Restored your last project");
        shell.print_info();
    }

    if let Some(path) = &args.file {
        shell.open(path).await;
    }

    if shell.controller.project().is_none() {
        console.info("Load a book with 'open <path>' (plain .txt works best).");
    }
    console.info("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut autosave = tokio::time::interval(config.autosave.interval());
    autosave.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately.
    autosave.tick().await;

    let mut show_prompt = true;
    loop {
        if show_prompt {
            console.prompt("uztrans>");
        }

        tokio::select! {
            _ = autosave.tick() => {
                let saved = shell.controller.autosave();
                shell.mark_saved(saved);
                show_prompt = false;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                show_prompt = true;

                let command = match Command::parse(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        console.warning(&message);
                        continue;
                    }
                };
                if !shell.run_command(command, &mut lines).await? {
                    break;
                }
            }
        }
    }

    // Final save on the way out.
    shell.controller.save();
    console.section("Xayr!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("open books/novel.txt"),
            Ok(Command::Open(PathBuf::from("books/novel.txt")))
        );
        assert_eq!(Command::parse("select 3"), Ok(Command::Select(2)));
        assert_eq!(Command::parse("  TRANSLATE "), Ok(Command::Translate));
        assert_eq!(
            Command::parse("export docx"),
            Ok(Command::Export(ExportFormat::Docx))
        );
        assert_eq!(Command::parse(""), Ok(Command::Empty));
        assert_eq!(Command::parse("q"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_command_errors() {
        assert!(Command::parse("open").is_err());
        assert!(Command::parse("select 0").is_err());
        assert!(Command::parse("select two").is_err());
        assert!(Command::parse("export odt").is_err());
        assert!(Command::parse("dance").is_err());
    }

    #[test]
    fn test_confirmation_answers() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }
}
