use crate::ops::ToolStatus;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Silent,
    Normal,
    Verbose,
}

/// Presentation settings, built once from the command line and handed to
/// everything that prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    pub verbosity: Verbosity,
    pub color: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self { verbosity: Verbosity::Normal, color: true }
    }
}

impl Output {
    pub fn new(verbose: bool, silent: bool, no_color: bool) -> Self {
        let verbosity = if silent {
            Verbosity::Silent
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Self { verbosity, color: !no_color }
    }

    /// Plain output for tests and embedding programs.
    pub fn plain() -> Self {
        Self { verbosity: Verbosity::Normal, color: false }
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self.verbosity {
            Verbosity::Silent => LevelFilter::ERROR,
            Verbosity::Normal => LevelFilter::INFO,
            Verbosity::Verbose => LevelFilter::DEBUG,
        }
    }

    /// Installs the process subscriber. A second call is a no-op.
    pub fn init_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_max_level(self.level_filter())
            .with_ansi(self.color)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .try_init();
    }

    pub fn banner(&self) {
        if self.verbosity == Verbosity::Silent {
            return;
        }
        let art = format!(
            r"
  __              __              _  __  __
 / /_____  ____  / /________ ___  (_)/ /_/ /_
/ __/ __ \/ __ \/ / ___/ __ `__ \/ // __/ __ \
/ /_/ /_/ / /_/ / (__  ) / / / / / // /_/ / / /
\__/\____/\____/_/____/_/ /_/ /_/_/ \__/_/ /_/  v{}
",
            env!("CARGO_PKG_VERSION")
        );
        eprintln!("{}", self.paint(&art, |s| s.bright_blue().to_string()));
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.color {
            style(text)
        } else {
            text.to_string()
        }
    }

    pub fn latest(&self, text: &str) -> String {
        self.paint(text, |s| s.bright_green().to_string())
    }

    pub fn outdated(&self, text: &str) -> String {
        self.paint(text, |s| s.red().to_string())
    }

    pub fn warning(&self, text: &str) -> String {
        self.paint(text, |s| s.bright_yellow().to_string())
    }

    pub fn muted(&self, text: &str) -> String {
        self.paint(text, |s| s.dimmed().to_string())
    }

    pub fn render_status(&self, status: &ToolStatus) -> String {
        match status {
            ToolStatus::NotSupported => self.muted("(not supported)"),
            ToolStatus::NotInstalled => self.warning("(not installed)"),
            ToolStatus::Latest(v) => self.latest(&format!("(latest) ({v})")),
            ToolStatus::Outdated { installed, latest } => format!(
                "{} ➡ {}",
                self.outdated(&format!("(outdated) ({installed})")),
                self.latest(&format!("({latest})"))
            ),
            ToolStatus::Unknown(reason) => self.muted(&format!("(unknown: {reason})")),
        }
    }

    /// Progress spinners run unless output is silenced.
    pub fn shows_progress(&self) -> bool {
        self.verbosity != Verbosity::Silent
    }

    pub fn spinner(&self, msg: String) -> ProgressBar {
        if !self.shows_progress() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg);
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_output_renders_status_words_without_escapes() {
        let out = Output::plain();
        assert_eq!(out.render_status(&ToolStatus::Latest("1.1.1".into())), "(latest) (1.1.1)");
        assert_eq!(
            out.render_status(&ToolStatus::Outdated { installed: "1.0.0".into(), latest: "v1.1.1".into() }),
            "(outdated) (1.0.0) ➡ (v1.1.1)"
        );
        assert_eq!(out.render_status(&ToolStatus::NotInstalled), "(not installed)");
        assert_eq!(out.render_status(&ToolStatus::NotSupported), "(not supported)");
    }

    #[test]
    fn silent_wins_over_verbose() {
        let out = Output::new(true, true, false);
        assert_eq!(out.verbosity, Verbosity::Silent);
        assert_eq!(out.level_filter(), LevelFilter::ERROR);
        assert!(!out.shows_progress());
        assert!(out.spinner("x".into()).is_hidden());
    }

    #[test]
    fn verbose_output_keeps_the_spinner() {
        assert!(Output::new(true, false, false).shows_progress());
        assert!(Output::new(false, false, true).shows_progress());
    }
}
