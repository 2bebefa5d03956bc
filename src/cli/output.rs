//! Terminal output for CLI commands.
//!
//! Progress goes to stdout, warnings to stderr, both through
//! `cyrup_termcolor` so markers are colored on a terminal and plain when
//! redirected. Log records from the library go through `env_logger`
//! independently.

use cyrup_termcolor::{Color, ColorChoice, ColorSpec, NoColor, StandardStream, WriteColor};
use std::io::{self, IsTerminal, Write};

/// Prints user-facing messages, honouring verbose and quiet modes.
#[derive(Debug, Clone, Copy)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

/// How a line is decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    Progress,
    Success,
    Warning,
    Header,
}

impl Style {
    fn prefix(self) -> &'static str {
        match self {
            Self::Plain | Self::Header => "",
            Self::Progress => "→ ",
            Self::Success => "✓ ",
            Self::Warning => "⚠ ",
        }
    }

    fn spec(self) -> ColorSpec {
        let mut spec = ColorSpec::new();
        match self {
            Self::Plain => {}
            Self::Progress => {
                spec.set_fg(Some(Color::Cyan));
            }
            Self::Success => {
                spec.set_fg(Some(Color::Green)).set_bold(true);
            }
            Self::Warning => {
                spec.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Self::Header => {
                spec.set_bold(true);
            }
        }
        spec
    }
}

/// Writes one decorated line. Headers are styled whole; other styles only
/// color their marker.
fn emit<W: WriteColor>(out: &mut W, style: Style, message: &str) -> io::Result<()> {
    if style == Style::Plain {
        return writeln!(out, "{message}");
    }

    out.set_color(&style.spec())?;
    if style == Style::Header {
        write!(out, "{message}")?;
        out.reset()?;
        return writeln!(out);
    }

    write!(out, "{}", style.prefix())?;
    out.reset()?;
    writeln!(out, "{message}")
}

fn color_choice(is_terminal: bool) -> ColorChoice {
    if is_terminal {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn stdout() -> StandardStream {
    StandardStream::stdout(color_choice(io::stdout().is_terminal()))
}

fn stderr() -> StandardStream {
    StandardStream::stderr(color_choice(io::stderr().is_terminal()))
}

impl OutputManager {
    /// Creates an output manager. `quiet` wins over `verbose`.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose: verbose && !quiet,
            quiet,
        }
    }

    fn line(&self, style: Style, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        emit(&mut stdout().lock(), style, message)
    }

    /// Detail shown only in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if self.verbose {
            self.line(Style::Plain, &format!("   {message}"))
        } else {
            Ok(())
        }
    }

    /// Step in progress.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        self.line(Style::Progress, message)
    }

    /// Completed step.
    pub fn success(&self, message: &str) -> io::Result<()> {
        self.line(Style::Success, message)
    }

    /// Non-fatal problem, printed to stderr even in quiet mode.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        emit(&mut stderr().lock(), Style::Warning, message)
    }

    /// Section header.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let stream = stdout();
        let mut out = stream.lock();
        writeln!(out)?;
        emit(&mut out, Style::Header, title)?;
        emit(&mut out, Style::Plain, &"─".repeat(title.chars().count()))
    }

    /// Indented detail line.
    pub fn indent(&self, message: &str) -> io::Result<()> {
        self.line(Style::Plain, &format!("   {message}"))
    }

    /// Prints a command result regardless of quiet mode, never colored.
    pub fn result(&self, message: &str) -> io::Result<()> {
        emit(&mut NoColor::new(io::stdout().lock()), Style::Plain, message)
    }
}
