use crate::span::Span;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("Config error: {msg}")]
    Config { msg: String, path: PathBuf },

    #[error("Validation error: {msg}")]
    Validation { msg: String, span: Option<Span> },

    #[error("Codegen error: {msg}")]
    Codegen { msg: String },

    #[error("I/O error: {msg}")]
    Io { msg: String },
}

impl GenError {
    pub fn config(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Config { msg: msg.into(), path }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation { msg: msg.into(), span: None }
    }

    pub fn validation_at(msg: impl Into<String>, span: Span) -> Self {
        Self::Validation { msg: msg.into(), span: Some(span) }
    }

    pub fn codegen(msg: impl Into<String>) -> Self {
        Self::Codegen { msg: msg.into() }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io { msg: msg.into() }
    }
}

/// Render a GenError with ariadne for nice terminal output.
/// Spanned validation errors get a labelled snippet of the config source.
pub fn render_error(source: &str, _filename: &str, err: &GenError) {
    use ariadne::{Label, Report, ReportKind, Source};

    match err {
        GenError::Validation { msg, span: Some(span) } => {
            Report::build(ReportKind::Error, (), span.start)
                .with_message("validation error")
                .with_label(Label::new(span.start..span.end).with_message(msg))
                .finish()
                .eprint(Source::from(source))
                .unwrap();
        }
        GenError::Validation { msg, span: None } => {
            eprintln!("error[validation]: {msg}");
        }
        GenError::Config { msg, path } => {
            eprintln!("error[config]: {msg}");
            eprintln!("  --> {}", path.display());
        }
        GenError::Codegen { msg } | GenError::Io { msg } => {
            eprintln!("error: {msg}");
        }
    }
}
