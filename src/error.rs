// src/error.rs
use std::io;
use thiserror::Error;

/// Result type used throughout the exporter library
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Custom Error type for the exporter
#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {path} returned {status}")]
    Status { path: String, status: u16 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Metric error: {0}")]
    Metric(String),

    #[error("Startup error: {0}")]
    Startup(String),
}

impl ExporterError {
    /// Whether the error must terminate the process.
    ///
    /// Only identity resolution at startup is fatal; everything raised during a
    /// scheduled poll ends that cycle and nothing more.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(self, ExporterError::Startup(_))
    }

    pub(crate) fn decode(context: &str, detail: impl std::fmt::Display) -> Self {
        ExporterError::Decode(format!("{}: {}", context, detail))
    }
}

impl From<prometheus::Error> for ExporterError {
    fn from(err: prometheus::Error) -> Self {
        ExporterError::Metric(err.to_string())
    }
}
