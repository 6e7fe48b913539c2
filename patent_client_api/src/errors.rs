//! Error types for the API client.

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unexpected response).
    #[error("Request failed")]
    RequestFailed,
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The response body could not be decoded.
    #[error("Failed to parse response: {0}")]
    Parse(String),
    /// The EDIS secret-key handshake failed or no credentials were supplied.
    #[error("Authentication failed: {0}")]
    Auth(String),
    /// Writing a downloaded file failed.
    #[error("Download failed: {0}")]
    Io(#[from] std::io::Error),
}
