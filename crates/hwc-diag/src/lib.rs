//! Structured diagnostics collection (spec §4.1).
//!
//! A [`Sink`] accumulates `{severity, position, message}` records from any
//! stage of the pipeline. Callers query [`Sink::had_errors`] between
//! stages rather than threading a `Result` through every function that
//! might notice something wrong — this mirrors the teacher's
//! `EventHooks`/telemetry-counter pattern (`core-events`): things report
//! into a shared sink without the sink owning or blocking the reporter.

use hwc_ssa::Position;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub pos: Option<Position>,
    pub message: String,
}

impl Diagnostic {
    fn to_text(&self) -> String {
        match &self.pos {
            Some(pos) => format!("{pos}: {}: {}", self.severity, self.message),
            None => format!("<unknown>: {}: {}", self.severity, self.message),
        }
    }
}

#[cfg(feature = "json")]
#[derive(serde::Serialize)]
struct DiagnosticJson<'a> {
    severity: &'static str,
    file: Option<&'a str>,
    line: Option<u32>,
    col: Option<u32>,
    message: &'a str,
}

/// A diagnostic at [`Severity::Fatal`] was reported; the caller should
/// treat the pipeline as terminated (spec §4.1: "a fatal diagnostic
/// prints and terminates the process").
#[derive(Debug, thiserror::Error)]
#[error("fatal: {0}")]
pub struct Fatal(pub String);

/// Accumulates diagnostics for one compilation. Not `Clone`: a sink is
/// meant to be threaded by `&mut` reference through one pipeline run.
#[derive(Debug, Default)]
pub struct Sink {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Errors and fatals increment the error
    /// counter; a fatal additionally prints to stderr and terminates the
    /// process immediately, matching the contract in spec §4.1 — callers
    /// that want to recover instead of aborting should use
    /// [`Sink::report_recoverable`].
    pub fn report(&mut self, severity: Severity, pos: Option<Position>, message: impl Into<String>) {
        let message = message.into();
        self.log(severity, pos.as_ref(), &message);
        let is_fatal = severity == Severity::Fatal;
        self.push(severity, pos, message.clone());
        if is_fatal {
            eprintln!("{}", self.diagnostics.last().unwrap().to_text());
            std::process::exit(1);
        }
    }

    /// Like [`Sink::report`] but never aborts the process, returning an
    /// error instead when `severity` is fatal. Stage entry points that
    /// want to unwind through `Result` rather than `process::exit` use
    /// this (e.g. tests, and `hwc-driver`'s `compile`).
    pub fn report_recoverable(
        &mut self,
        severity: Severity,
        pos: Option<Position>,
        message: impl Into<String>,
    ) -> Result<(), Fatal> {
        let message = message.into();
        self.log(severity, pos.as_ref(), &message);
        let is_fatal = severity == Severity::Fatal;
        self.push(severity, pos, message.clone());
        if is_fatal {
            Err(Fatal(message))
        } else {
            Ok(())
        }
    }

    fn push(&mut self, severity: Severity, pos: Option<Position>, message: String) {
        if severity >= Severity::Error {
            self.error_count += 1;
        }
        self.diagnostics.push(Diagnostic {
            severity,
            pos,
            message,
        });
    }

    fn log(&self, severity: Severity, pos: Option<&Position>, message: &str) {
        match severity {
            Severity::Info => tracing::info!(pos = ?pos, "{message}"),
            Severity::Warning => tracing::warn!(pos = ?pos, "{message}"),
            Severity::Error | Severity::Fatal => tracing::error!(pos = ?pos, "{message}"),
        }
    }

    pub fn had_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Plain-text `file:line:col: severity: message` rendering, one
    /// diagnostic per line, in report order.
    pub fn emit_text(&self, w: &mut dyn Write) -> io::Result<()> {
        for d in &self.diagnostics {
            writeln!(w, "{}", d.to_text())?;
        }
        Ok(())
    }

    /// Machine-readable rendering: one JSON object per diagnostic, one
    /// per line (JSON Lines), so callers can stream it without buffering
    /// a single giant array.
    #[cfg(feature = "json")]
    pub fn emit_json(&self, w: &mut dyn Write) -> io::Result<()> {
        for d in &self.diagnostics {
            let j = DiagnosticJson {
                severity: d.severity.as_str(),
                file: d.pos.as_ref().map(|p| p.file.as_str()),
                line: d.pos.as_ref().map(|p| p.line),
                col: d.pos.as_ref().map(|p| p.col),
                message: &d.message,
            };
            let line = serde_json::to_string(&j)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            writeln!(w, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32) -> Position {
        Position::new("main.go", line, 1)
    }

    #[test]
    fn had_errors_tracks_error_and_fatal_only() {
        let mut sink = Sink::new();
        sink.report(Severity::Info, Some(pos(1)), "fyi");
        sink.report(Severity::Warning, Some(pos(2)), "heads up");
        assert!(!sink.had_errors());

        sink.report(Severity::Error, Some(pos(3)), "nope");
        assert!(sink.had_errors());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn text_rendering_matches_file_line_col_severity_message() {
        let mut sink = Sink::new();
        sink.report(Severity::Error, Some(pos(7)), "mixed signed/unsigned operands");
        let mut buf = Vec::new();
        sink.emit_text(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "main.go:7:1: error: mixed signed/unsigned operands\n");
    }

    #[test]
    fn fatal_via_recoverable_path_returns_err_without_exiting() {
        let mut sink = Sink::new();
        let result = sink.report_recoverable(Severity::Fatal, None, "non-convergent width inference");
        assert!(result.is_err());
        assert!(sink.had_errors());
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_rendering_is_one_object_per_line() {
        let mut sink = Sink::new();
        sink.report(Severity::Warning, Some(pos(2)), "dropped print: unsupported verb");
        sink.report(Severity::Error, None, "missing entry function");
        let mut buf = Vec::new();
        sink.emit_json(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().next().unwrap().contains("\"severity\":\"warning\""));
    }
}
