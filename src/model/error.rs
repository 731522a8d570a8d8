//! Model Error Types
//!
//! Errors produced while decoding and indexing the maturity-model dataset.

use thiserror::Error;

/// Errors from the data model layer
#[derive(Error, Debug)]
pub enum ModelError {
    /// Neither the uuid nor the name resolved to an activity
    #[error("activity not found (uuid: '{uuid}', name: '{name}')")]
    ActivityNotFound { uuid: String, name: String },

    /// A required key is missing from meta.yaml
    #[error("the meta file has no '{0}' to be loaded")]
    MissingMetaKey(&'static str),

    /// The document did not decode into the expected typed shape
    #[error("failed to decode '{context}': {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Dataset validation produced one or more error messages
    #[error("data validation error after loading '{file}':\n{}", .messages.join("\n"))]
    Validation { file: String, messages: Vec<String> },

    /// YAML serialization failed during export
    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
