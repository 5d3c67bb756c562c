//! Error handling for tractstream
//!
//! This module defines the crate error type and a Result alias used
//! throughout the pipeline.
//!
//! Only conditions that stop a session from starting (or a caller from
//! getting what it asked for) are errors. A tracking engine that finds no
//! streamline, a streamline with coincident points, and a batch lost to
//! handoff backpressure are all ordinary outcomes that are counted in
//! [`PipelineStats`](crate::types::PipelineStats) instead.

use thiserror::Error;

/// Main error type for tractstream operations
#[derive(Error, Debug)]
pub enum TractError {
    /// The world-to-tracker affine cannot be inverted
    #[error("Transform error: {0}")]
    Transform(String),

    /// Streamline geometry that cannot be meshed as requested
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// Errors related to configuration loading/saving/validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// A worker thread panicked before it could be joined
    #[error("Worker '{0}' panicked")]
    WorkerPanicked(String),

    /// The session was already stopped
    #[error("Session already stopped")]
    SessionStopped,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TractError>,
    },
}

impl TractError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TractError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for TractError {
    fn from(err: serde_json::Error) -> Self {
        TractError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for TractError {
    fn from(err: toml::de::Error) -> Self {
        TractError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for TractError {
    fn from(err: toml::ser::Error) -> Self {
        TractError::Serialization(err.to_string())
    }
}

/// Result type alias for tractstream operations
pub type Result<T> = std::result::Result<T, TractError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
