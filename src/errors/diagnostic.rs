//! Pretty diagnostic reporting using ariadne
//!
//! The analyzer itself never sees source text (its input is a parsed
//! tree), so rendering is a service for hosts that kept the source
//! around.

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::errors::{Located, SemanticError, SemanticWarning};

fn error_report(filename: &str, error: &Located<SemanticError>) -> Report<'static> {
    let header = if filename.is_empty() {
        "Semantic error".to_string()
    } else {
        format!("Semantic error in {}", filename)
    };

    let span = error.span;
    let mut report = Report::build(ReportKind::Error, span.start..span.end).with_message(header);

    if !span.is_empty() {
        report = report.with_label(
            Label::new(span.start..span.end)
                .with_message(error.value.to_string())
                .with_color(Color::Red),
        );
    }

    report.finish()
}

fn warning_report(filename: &str, warning: &Located<SemanticWarning>) -> Report<'static> {
    let header = if filename.is_empty() {
        "Warning".to_string()
    } else {
        format!("Warning in {}", filename)
    };

    let span = warning.span;
    let mut report = Report::build(ReportKind::Warning, span.start..span.end).with_message(header);

    if !span.is_empty() {
        report = report.with_label(
            Label::new(span.start..span.end)
                .with_message(warning.value.to_string())
                .with_color(Color::Yellow),
        );
    }

    report.finish()
}

/// Print an error with source context
pub fn print_error(source: &str, filename: &str, error: &Located<SemanticError>) {
    error_report(filename, error)
        .print(Source::from(source))
        .expect("failed to print error report");
}

/// Print a warning with source context
pub fn print_warning(source: &str, filename: &str, warning: &Located<SemanticWarning>) {
    warning_report(filename, warning)
        .print(Source::from(source))
        .expect("failed to print warning report");
}

/// Print multiple errors
pub fn print_errors(source: &str, filename: &str, errors: &[Located<SemanticError>]) {
    for error in errors {
        print_error(source, filename, error);
    }
}

/// Print multiple warnings
pub fn print_warnings(source: &str, filename: &str, warnings: &[Located<SemanticWarning>]) {
    for warning in warnings {
        print_warning(source, filename, warning);
    }
}

/// Format an error as a string (for testing)
pub fn format_error(source: &str, filename: &str, error: &Located<SemanticError>) -> String {
    let mut output = Vec::new();

    error_report(filename, error)
        .write(Source::from(source), &mut output)
        .expect("failed to write error report");

    String::from_utf8(output).expect("error report should be valid UTF-8")
}
