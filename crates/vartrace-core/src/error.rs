//! Error taxonomy for the tracing core
//!
//! Configuration problems (unknown builder kind, unreadable config or
//! source files) are fatal at startup. Lookup misses are not errors; the
//! corresponding APIs return `Option`. A formula that fails to re-parse
//! from its own printed form indicates a printer/parser mismatch and is
//! surfaced as `FormulaParse`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the tracing core and its bundled collaborators.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The requested tree builder kind is not known.
    #[error("unsupported tree builder kind: {0}")]
    UnsupportedBuilder(String),

    /// A variant configuration file exists but could not be read.
    #[error("failed to read configuration {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file or directory could not be read while building a tree.
    #[error("failed to read source {}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A formula could not be reconstructed from its printed form.
    #[error("failed to parse formula {text:?}: {reason}")]
    FormulaParse { text: String, reason: String },

    /// Reading or writing a persisted variant or merged tree failed.
    #[error("failed to persist {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted blob could not be encoded or decoded.
    #[error("failed to encode or decode {}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The worker pool for a bulk operation could not be created.
    #[error("failed to build worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
