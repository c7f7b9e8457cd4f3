//! Error types for dispatch and configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::decoder::DecodeError;

/// Why a command line was not executed.
///
/// The `Display` text of each variant is exactly what the command source
/// receives through [`crate::source::CommandSource::fail`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The line does not start with the configured prefix.
    #[error("Invalid command")]
    PrefixMismatch { prefix: String },

    /// The source lacks a permission required by a node on the path.
    #[error("Permission denied")]
    PermissionDenied { permission: String },

    /// An argument decoder rejected a token.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Tokens remain with nowhere to go, or tokens ran out before a handler.
    #[error("Invalid command")]
    DeadEnd,

    /// Every registered namespace failed to consume the line.
    #[error("Invalid command")]
    NoNamespaceMatched,
}

impl DispatchError {
    /// Short variant name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PrefixMismatch { .. } => "prefix_mismatch",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Decode(_) => "decode_failure",
            Self::DeadEnd => "dead_end",
            Self::NoNamespaceMatched => "no_namespace_matched",
        }
    }
}

/// A handler asked for an argument the parse path did not produce.
///
/// Only raised when a handler and the decoders above it disagree, never by
/// user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("Missing argument {index}")]
    Missing { index: usize },

    #[error("Argument {index} is not a {expected}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
    },
}

/// Errors raised while loading a dispatcher configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
