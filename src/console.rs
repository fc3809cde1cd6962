//! Terminal output for the interactive shell.
//!
//! One-line notices carry a colored tag (`[OK]`, `[WARN]`, ...). Color is only
//! emitted when stdout is a TTY and `NO_COLOR` is unset.

use std::io::{self, IsTerminal, Write};

const RESET: &str = "\x1b[0m";

/// SGR attributes the shell uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Style {
    const fn sgr(self) -> u8 {
        match self {
            Style::Bold => 1,
            Style::Dim => 2,
            Style::Red => 31,
            Style::Green => 32,
            Style::Yellow => 33,
            Style::Blue => 34,
            Style::Magenta => 35,
            Style::Cyan => 36,
            Style::Gray => 90,
        }
    }
}

/// Kind of one-line notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Success,
    Warning,
    Error,
    /// A remote call or other slow step is starting.
    Step,
}

impl Notice {
    fn tag(self) -> (&'static str, Style) {
        match self {
            Notice::Info => ("INFO", Style::Blue),
            Notice::Success => ("OK", Style::Green),
            Notice::Warning => ("WARN", Style::Yellow),
            Notice::Error => ("ERROR", Style::Red),
            Notice::Step => ("..", Style::Cyan),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Console {
    colors: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Detect color support from the environment.
    pub fn new() -> Self {
        Self::with_colors(std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal())
    }

    pub fn with_colors(colors: bool) -> Self {
        Self { colors }
    }

    /// Wrap `text` in the given attributes. Plain text when colors are off.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors || styles.is_empty() {
            return text.to_owned();
        }
        let sgr = styles
            .iter()
            .map(|s| s.sgr().to_string())
            .collect::<Vec<_>>()
            .join(";");
        format!("\x1b[{sgr}m{text}{RESET}")
    }

    /// `[TAG] message`, styled but not printed.
    pub fn format_notice(&self, notice: Notice, message: &str) -> String {
        let (tag, color) = notice.tag();
        format!("[{}] {}", self.style(tag, &[color, Style::Bold]), message)
    }

    /// Print a notice. Errors go to stderr, everything else to stdout.
    pub fn notice(&self, notice: Notice, message: &str) {
        let line = self.format_notice(notice, message);
        match notice {
            Notice::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }

    pub fn info(&self, message: &str) {
        self.notice(Notice::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.notice(Notice::Success, message);
    }

    pub fn warning(&self, message: &str) {
        self.notice(Notice::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.notice(Notice::Error, message);
    }

    pub fn step(&self, message: &str) {
        self.notice(Notice::Step, message);
    }

    /// Blank line, then a bold magenta heading.
    pub fn section(&self, title: &str) {
        println!("\n{}", self.style(title, &[Style::Magenta, Style::Bold]));
    }

    /// Print preformatted text (lists, reader panes) unchanged.
    pub fn block(&self, text: &str) {
        println!("{text}");
    }

    pub fn muted(&self, text: &str) -> String {
        self.style(text, &[Style::Gray, Style::Dim])
    }

    /// Shell prompt, left on the current line.
    pub fn prompt(&self, text: &str) {
        print!("{} ", self.style(text, &[Style::Cyan, Style::Bold]));
        let _ = io::stdout().flush();
    }

    /// `SAVED 14:02`
    pub fn saved_badge(&self, time: &str) -> String {
        format!(
            "{} {}",
            self.style("SAVED", &[Style::Green, Style::Bold]),
            self.muted(time)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output_without_colors() {
        let console = Console::with_colors(false);
        assert_eq!(console.style("kitob", &[Style::Red, Style::Bold]), "kitob");
        assert_eq!(
            console.format_notice(Notice::Warning, "No chapters"),
            "[WARN] No chapters"
        );
        assert_eq!(console.saved_badge("09:30"), "SAVED 09:30");
    }

    #[test]
    fn test_styles_join_sgr_codes() {
        let console = Console::with_colors(true);
        assert_eq!(
            console.style("kitob", &[Style::Bold, Style::Red]),
            "\x1b[1;31mkitob\x1b[0m"
        );
        assert_eq!(console.style("kitob", &[]), "kitob");
    }

    #[test]
    fn test_notice_tags() {
        let console = Console::with_colors(true);
        let line = console.format_notice(Notice::Success, "Project saved");
        assert!(line.starts_with("[\x1b[32;1mOK"));
        assert!(line.ends_with("] Project saved"));

        let console = Console::with_colors(false);
        assert_eq!(console.format_notice(Notice::Step, "Analyzing"), "[..] Analyzing");
        assert_eq!(console.format_notice(Notice::Error, "boom"), "[ERROR] boom");
    }
}
