//! Error types for registration, rewrite-chain selection and descriptor decoding

use std::path::PathBuf;

use thiserror::Error;

/// Scope label used when a template-scoped transformer is invalid
pub const TEMPLATE_SCOPE: &str = "<template>";

/// Errors raised by the lookup itself
///
/// All of these indicate a broken integration or a corrupt descriptor. They
/// are returned to the caller as soon as they are detected and are never
/// skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// A library was handed to `register` without an id
    #[error("tag library id expected")]
    MissingLibraryId,

    /// A transformer reachable from a tag or the template has no path
    #[error("invalid transformer #{index} for {scope}: missing path")]
    InvalidTransformer { scope: String, index: usize },

    /// A migrator reachable from a tag cannot be invoked
    #[error("invalid migrator #{index} for tag '{tag}'")]
    InvalidMigrator { tag: String, index: usize },
}

impl LookupError {
    /// Create an invalid transformer error
    pub fn invalid_transformer(scope: impl Into<String>, index: usize) -> Self {
        Self::InvalidTransformer {
            scope: scope.into(),
            index,
        }
    }

    /// Create an invalid migrator error
    pub fn invalid_migrator(tag: impl Into<String>, index: usize) -> Self {
        Self::InvalidMigrator {
            tag: tag.into(),
            index,
        }
    }
}

/// Errors that can occur when decoding a tag library descriptor
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read descriptor file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse descriptor TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid pattern for attribute '{attribute}': {source}")]
    InvalidPattern {
        attribute: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type using LookupError
pub type Result<T> = std::result::Result<T, LookupError>;
