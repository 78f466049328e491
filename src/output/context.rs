use super::Theme;
use crate::cli::Cli;
use rich_rust::prelude::*;
use rich_rust::renderables::Renderable;
use std::io::IsTerminal;

/// Routes command output to the console, plain stdout or JSON.
pub struct OutputContext {
    console: Console,
    theme: Theme,
    mode: OutputMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Tables, colors and panels on a terminal
    Rich,
    /// Fixed-width text without ANSI codes
    Plain,
    /// One JSON document on stdout
    Json,
    /// Errors only
    Quiet,
}

impl OutputContext {
    /// Create from CLI global args.
    #[must_use]
    pub fn from_args(args: &Cli) -> Self {
        Self::from_flags(args.json, args.quiet, args.no_color)
    }

    /// `--json` beats `--quiet`; `NO_COLOR` or a piped stdout means plain.
    #[must_use]
    pub fn from_flags(json: bool, quiet: bool, no_color: bool) -> Self {
        let mode = if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else if no_color || std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal()
        {
            OutputMode::Plain
        } else {
            OutputMode::Rich
        };

        let console = match mode {
            OutputMode::Rich => Console::new(),
            OutputMode::Plain | OutputMode::Quiet | OutputMode::Json => {
                Console::builder().no_color().force_terminal(false).build()
            }
        };

        Self {
            console,
            theme: Theme::default(),
            mode,
        }
    }

    #[must_use]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }
    #[must_use]
    pub fn is_rich(&self) -> bool {
        self.mode == OutputMode::Rich
    }
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.mode == OutputMode::Quiet
    }
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    // ─────────────────────────────────────────────────────────────
    // Output Methods
    // ─────────────────────────────────────────────────────────────

    /// Rich mode parses `content` as console markup; plain mode prints it
    /// verbatim.
    pub fn print(&self, content: &str) {
        match self.mode {
            OutputMode::Rich => self.console.print(content),
            OutputMode::Plain => println!("{content}"),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    pub fn render<R: Renderable>(&self, renderable: &R) {
        if self.is_rich() {
            self.console.print_renderable(renderable);
        }
    }

    /// Pretty-printed JSON document (JSON mode only).
    pub fn json_pretty<T: serde::Serialize>(&self, value: &T) {
        if !self.is_json() {
            return;
        }
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(err) => tracing::error!(error = %err, "Failed to serialize JSON output"),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Semantic Output Methods
    // ─────────────────────────────────────────────────────────────

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Rich => {
                self.console.print(&format!("[bold green]✓[/] {message}"));
            }
            OutputMode::Plain => println!("✓ {message}"),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    pub fn info(&self, message: &str) {
        match self.mode {
            OutputMode::Rich => {
                self.console.print(&format!("[blue]ℹ[/] {message}"));
            }
            OutputMode::Plain => println!("{message}"),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    pub fn section(&self, title: &str) {
        match self.mode {
            OutputMode::Rich => {
                let rule = Rule::with_title(Text::styled(title, self.theme.section.clone()));
                self.console.print_renderable(&rule);
            }
            OutputMode::Plain => println!("\n─── {title} ───\n"),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    pub fn newline(&self) {
        if matches!(self.mode, OutputMode::Rich | OutputMode::Plain) {
            println!();
        }
    }
}
