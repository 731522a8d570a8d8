//! Loader Error Types
//!
//! Errors from fetching and parsing the YAML dataset. Everything here is
//! recoverable: a failed load never poisons the loader, a later call simply
//! retries.

use thiserror::Error;

use crate::model::ModelError;

/// Errors that can occur while loading the dataset
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Transport-level fetch failure
    #[error("failed to fetch '{url}': {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("failed to fetch '{url}': HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The fetched text is not valid YAML
    #[error("failed to parse '{path}' as YAML: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Decoding or validating the dataset failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A relative reference resolved outside the dataset root
    #[error("the path '{path}' is not allowed outside its root folder '{root}'")]
    PathEscape { path: String, root: String },

    /// `$ref` nesting exceeded the recursion guard
    #[error("$ref nesting too deep while resolving '{0}'")]
    RefDepth(String),

    /// A `$ref` pointed at a key path that does not exist
    #[error("cannot find '{path}' in {file}")]
    RefNotFound { path: String, file: String },

    /// An activity file had an unexpected document structure
    #[error(
        "the activity file '{0}' is expected to contain dimensions and activities, \
         with an optional meta document at the start"
    )]
    BadActivityFile(String),
}

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;
