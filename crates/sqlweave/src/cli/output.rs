//! Output formatting utilities

use crate::WeaveError;
use colored::Colorize;

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_ascii_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        // `colored` already honors NO_COLOR and CLICOLOR
        _ => colored::control::unset_override(),
    }
}

/// Format an error for display
///
/// sqlweave errors render as full diagnostics with their code, caret and
/// help; anything else (I/O, bad arguments) is a one-line message with its
/// context chain.
pub fn format_error(error: &anyhow::Error) -> String {
    match error.downcast_ref::<WeaveError>() {
        Some(err) => err.to_diagnostic().render_colored(),
        None => format!("{} {:#}", "error:".red().bold(), error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_weave_errors_render_as_diagnostics() {
        colored::control::set_override(false);
        let err = crate::parse_type("DECIMAL(40, 2)").unwrap_err();
        let rendered = format_error(&anyhow::Error::from(err));
        assert!(rendered.starts_with("error[SQW0005]:"), "{rendered}");
        assert!(rendered.contains("| DECIMAL(40, 2)"));
    }

    #[test]
    fn test_other_errors_keep_context() {
        colored::control::set_override(false);
        let err = std::fs::read_to_string("/nonexistent/catalog.json")
            .context("reading catalog")
            .unwrap_err();
        let rendered = format_error(&err);
        assert!(rendered.starts_with("error: reading catalog: "), "{rendered}");
    }
}
