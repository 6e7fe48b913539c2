//! Streams a response body to disk.

use std::fs::File;
use std::path::Path;

use reqwest::blocking::RequestBuilder;

use crate::Error;

/// Sends `request` and writes the body to `dest`. A partially written file is
/// removed when the transfer fails.
pub(crate) fn download_to(request: RequestBuilder, dest: &Path) -> Result<u64, Error> {
    let mut resp = request.send().map_err(|e| {
        tracing::error!("Failed to start download: {}", e);
        Error::RequestFailed
    })?;

    let status = resp.status();
    if !status.is_success() {
        tracing::error!("Download failed with status {}", status);
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            body: String::new(),
        });
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(dest)?;
    match resp.copy_to(&mut file) {
        Ok(bytes) => {
            tracing::debug!("Downloaded {} bytes to {}", bytes, dest.display());
            Ok(bytes)
        }
        Err(e) => {
            tracing::error!("Download interrupted: {}", e);
            drop(file);
            let _ = std::fs::remove_file(dest);
            Err(Error::RequestFailed)
        }
    }
}
