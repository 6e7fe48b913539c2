//! Error types for the library layer.

/// Errors produced by the query/record layer, wrapping upstream API errors
/// and adding lookup, range, cache and configuration failures.
#[derive(thiserror::Error, Debug)]
pub enum PatentClientError {
    /// An error from the underlying HTTP collaborators.
    #[error("API error: {0}")]
    Api(#[from] patent_client_api::Error),
    /// `get` matched more than one record.
    #[error("More than one {model} found!\n{}", .matches.join("\n"))]
    MultipleResults { model: String, matches: Vec<String> },
    /// A relation target, relation name or record field could not be found.
    #[error("Lookup error: {0}")]
    Lookup(String),
    /// The collection does not support the requested operation.
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    /// Indexing past the end of a collection.
    #[error("Index {index} out of range for a collection of {count} items")]
    OutOfRange { index: usize, count: usize },
    /// Caller-provided arguments were rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A cache file exists but cannot be decoded.
    #[error("Cache error: {0}")]
    Cache(String),
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The settings file or environment is unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}
