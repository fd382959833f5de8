//! sqlweave error types

use crate::{ErrorCode, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// The operation cannot proceed
    Error,
    /// Result is usable but likely not what the caller wants
    Warning,
    /// Informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message ready to be shown to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    /// Offending text, when the error came from parsing a string
    pub source: Option<String>,
    /// Byte span inside `source`
    pub location: Option<Span>,
    pub help: Option<String>,
    /// Related notes, e.g. each unresolved column
    pub related: Vec<String>,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, code, message)
    }

    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, code, message)
    }

    fn with_severity(severity: Severity, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            source: None,
            location: None,
            help: code.info().help.map(str::to_string),
            related: Vec::new(),
        }
    }

    /// Attach the offending source text and span
    pub fn with_source(mut self, source: impl Into<String>, span: Span) -> Self {
        self.source = Some(source.into());
        self.location = Some(span);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_related(mut self, note: impl Into<String>) -> Self {
        self.related.push(note.into());
        self
    }

    /// Multi-line rendering with a caret under the offending span
    pub fn render(&self) -> String {
        let mut out = format!("{}[{}]: {}", self.severity, self.code, self.message);
        if let (Some(source), Some(span)) = (&self.source, &self.location) {
            out.push_str(&format!("\n  | {}\n  | {}", source, span.underline(source)));
        }
        for note in &self.related {
            out.push_str(&format!("\n  = note: {note}"));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  = help: {help}"));
        }
        out
    }

    /// Same layout as [`Diagnostic::render`], colored for terminals
    #[cfg(feature = "colored")]
    pub fn render_colored(&self) -> String {
        use colored::Colorize;

        let header = match self.severity {
            Severity::Error => format!("{}[{}]", self.severity, self.code).red().bold(),
            Severity::Warning => format!("{}[{}]", self.severity, self.code).yellow().bold(),
            Severity::Info => format!("{}[{}]", self.severity, self.code).blue().bold(),
        };
        let mut out = format!("{}: {}", header, self.message.bold());
        if let (Some(source), Some(span)) = (&self.source, &self.location) {
            out.push_str(&format!(
                "\n  {} {}\n  {} {}",
                "|".blue(),
                source,
                "|".blue(),
                span.underline(source).red()
            ));
        }
        for note in &self.related {
            out.push_str(&format!("\n  {} {note}", "= note:".blue()));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  {} {help}", "= help:".green()));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(span) = &self.location {
            write!(f, " at {}", span)?;
        }
        Ok(())
    }
}

/// Top-level sqlweave error
#[derive(Debug, Clone, Error)]
pub enum WeaveError {
    /// Type construction or type-string parsing failed
    #[error("{code}: {message}")]
    Type {
        code: ErrorCode,
        message: String,
        source_text: Option<String>,
        location: Option<Span>,
    },

    /// No common supertype exists
    #[error("{code}: {message}")]
    Coercion { code: ErrorCode, message: String },

    /// Field or relation resolution failed
    #[error("{code}: {message}")]
    Resolution {
        code: ErrorCode,
        message: String,
        related: Vec<String>,
    },

    /// An expression node could not be built
    #[error("{code}: {message}")]
    Expression { code: ErrorCode, message: String },

    /// I/O or configuration failure
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Multiple errors collected
    #[error("Multiple errors: {}", .0.len())]
    Multiple(Vec<WeaveError>),
}

impl WeaveError {
    pub fn type_error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Type {
            code,
            message: message.into(),
            source_text: None,
            location: None,
        }
    }

    /// Type error pointing into the string that failed to parse
    pub fn type_error_at(
        code: ErrorCode,
        message: impl Into<String>,
        source_text: impl Into<String>,
        location: Span,
    ) -> Self {
        Self::Type {
            code,
            message: message.into(),
            source_text: Some(source_text.into()),
            location: Some(location),
        }
    }

    pub fn coercion(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Coercion {
            code,
            message: message.into(),
        }
    }

    pub fn resolution(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Resolution {
            code,
            message: message.into(),
            related: Vec::new(),
        }
    }

    pub fn expression(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Expression {
            code,
            message: message.into(),
        }
    }

    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Type { code, .. }
            | Self::Coercion { code, .. }
            | Self::Resolution { code, .. }
            | Self::Expression { code, .. }
            | Self::System { code, .. } => *code,
            Self::Multiple(errors) => errors
                .first()
                .map(|e| e.code())
                .unwrap_or(ErrorCode::new(0)),
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Type {
                code,
                message,
                source_text,
                location,
            } => {
                let diag = Diagnostic::error(*code, message.clone());
                match (source_text, location) {
                    (Some(text), Some(span)) => diag.with_source(text.clone(), *span),
                    _ => diag,
                }
            }
            Self::Coercion { code, message } | Self::Expression { code, message } => {
                Diagnostic::error(*code, message.clone())
            }
            Self::Resolution {
                code,
                message,
                related,
            } => related
                .iter()
                .fold(Diagnostic::error(*code, message.clone()), |diag, note| {
                    diag.with_related(note.clone())
                }),
            Self::System {
                code,
                message,
                context,
            } => {
                let diag = Diagnostic::error(*code, message.clone());
                match context {
                    Some(ctx) => diag.with_help(ctx.clone()),
                    None => diag,
                }
            }
            Self::Multiple(errors) => match errors.first() {
                Some(first) => errors[1..]
                    .iter()
                    .fold(first.to_diagnostic(), |diag, e| diag.with_related(e.to_string())),
                None => Diagnostic::error(ErrorCode::new(0), "Unknown error"),
            },
        }
    }
}

/// Builder for [`WeaveError`] values carrying extra context
pub struct ErrorBuilder {
    code: ErrorCode,
    message: String,
    related: Vec<String>,
    context: Option<String>,
}

impl ErrorBuilder {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            related: Vec::new(),
            context: None,
        }
    }

    /// Add a related note
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.related.push(note.into());
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn resolution(self) -> WeaveError {
        WeaveError::Resolution {
            code: self.code,
            message: self.message,
            related: self.related,
        }
    }

    pub fn system(self) -> WeaveError {
        WeaveError::System {
            code: self.code,
            message: self.message,
            context: self.context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SQW0005, SQW0010, SQW0202, SQW0402};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_builder() {
        let err = ErrorBuilder::new(SQW0202, "2 column references left unresolved")
            .note("w")
            .note("c.v")
            .resolution();

        assert!(matches!(err, WeaveError::Resolution { .. }));
        assert_eq!(err.code(), SQW0202);
        assert_eq!(err.to_diagnostic().related, vec!["w", "c.v"]);
    }

    #[test]
    fn test_system_error_context_becomes_help() {
        let err = ErrorBuilder::new(SQW0402, "invalid options file")
            .context("expected a JSON object")
            .system();
        assert_eq!(
            err.to_diagnostic().help.as_deref(),
            Some("expected a JSON object")
        );
    }

    #[test]
    fn test_diagnostic_render() {
        let err = WeaveError::type_error_at(
            SQW0010,
            "expected ')'",
            "DECIMAL(4,2",
            Span::point(11),
        );
        let rendered = err.to_diagnostic().render();
        assert_eq!(
            rendered,
            "error[SQW0010]: expected ')'\n  | DECIMAL(4,2\n  |            ^"
        );
    }

    #[test]
    fn test_diagnostic_display_uses_default_help() {
        let diag = Diagnostic::error(SQW0005, "precision 40 is out of range");
        assert!(diag.to_string().contains("SQW0005"));
        assert!(diag.help.is_some());
    }
}
