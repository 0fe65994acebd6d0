//! Error types for annotation tree building, schema loading and compilation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while building an annotation tree.
///
/// Malformed schema content never errors; it simply contributes no
/// annotations. Only a reference cycle aborts a build.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("reference cycle: {}", chain.join(" -> "))]
    ReferenceCycle { chain: Vec<String> },
}

/// Errors while loading schema or payload documents.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("remote schemas require the `remote` feature: {url}")]
    RemoteDisabled { url: String },
}

/// Errors while compiling a [`Schema`](crate::Schema).
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid {which} schema: {message}")]
    Compile { which: &'static str, message: String },

    #[error("cannot index '{field}' annotations: {source}")]
    Build {
        field: String,
        #[source]
        source: BuildError,
    },
}

impl BuildError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

impl SchemaError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SchemaError::Load(e) => e.exit_code(),
            SchemaError::Build { source, .. } => source.exit_code(),
            SchemaError::Compile { .. } => 2,
        }
    }
}
