//! Document and attachment downloads through a per-case file cache.

use std::fs;
use std::path::{Path, PathBuf};

use patent_client_api::{EdisClient, PtabClient};

use crate::error::PatentClientError;
use crate::record::Record;

/// File extension (with the dot) for the media types PTAB serves.
pub fn guess_extension(media_type: &str) -> Option<&'static str> {
    let essence = media_type.split(';').next().unwrap_or("").trim();
    let ext = match essence.to_ascii_lowercase().as_str() {
        "application/pdf" => ".pdf",
        "application/msword" => ".doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => ".docx",
        "application/zip" => ".zip",
        "application/xml" | "text/xml" => ".xml",
        "application/json" => ".json",
        "text/plain" => ".txt",
        "text/html" => ".html",
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/tiff" => ".tif",
        _ => return None,
    };
    Some(ext)
}

fn safe_name(name: &str) -> String {
    name.trim().replace('/', "_")
}

fn expect_model(record: &Record, model: &str) -> Result<(), PatentClientError> {
    if record.model_name() == model {
        Ok(())
    } else {
        Err(PatentClientError::InvalidInput(format!(
            "expected a {} record, got {}",
            model,
            record.model_name()
        )))
    }
}

/// Downloads into `cached` unless it already exists, then copies it into
/// `dest_dir`. Returns the copy's path.
fn fetch_once<F>(
    cached: &Path,
    dest_dir: &Path,
    download: F,
) -> Result<PathBuf, PatentClientError>
where
    F: FnOnce(&Path) -> Result<u64, patent_client_api::Error>,
{
    if cached.exists() {
        tracing::debug!("Using cached file {}", cached.display());
    } else {
        download(cached)?;
    }
    let file_name = cached.file_name().ok_or_else(|| {
        PatentClientError::InvalidInput(format!("no file name in {}", cached.display()))
    })?;
    fs::create_dir_all(dest_dir)?;
    let out = dest_dir.join(file_name);
    if out != cached {
        fs::copy(cached, &out)?;
    }
    Ok(out)
}

/// Downloads a `PtabDocument` file into `dest_dir`.
///
/// The file is named after the document title and cached under
/// `<cache_dir>/ptab/<trial_number>/`.
pub fn download_ptab_document(
    client: &PtabClient,
    cache_dir: &Path,
    document: &Record,
    dest_dir: &Path,
) -> Result<PathBuf, PatentClientError> {
    expect_model(document, "PtabDocument")?;
    let url = document.accessor("links__1__href")?;
    let url = url.as_str().ok_or_else(|| {
        PatentClientError::Lookup(format!("{} has no download link", document))
    })?;
    let extension = document
        .get("media_type")
        .and_then(|m| m.as_str())
        .and_then(guess_extension)
        .unwrap_or("");
    let file_name = format!("{}{}", safe_name(document.str_field("title")?), extension);
    let cached = cache_dir
        .join("ptab")
        .join(safe_name(document.str_field("trial_number")?))
        .join(file_name);
    fetch_once(&cached, dest_dir, |path| client.download(url, path))
}

/// Downloads an `ItcAttachment` file into `dest_dir` as
/// `<document title> - <attachment title>.<ext>`.
///
/// Resolves the attachment's document and investigation to name the file and
/// its cache folder `<cache_dir>/itc_edis/<investigation number>/`.
pub fn download_itc_attachment(
    client: &EdisClient,
    cache_dir: &Path,
    attachment: &Record,
    dest_dir: &Path,
) -> Result<PathBuf, PatentClientError> {
    expect_model(attachment, "ItcAttachment")?;
    let url = attachment.str_field("download_url")?;
    let extension = attachment
        .str_field("file_name")?
        .rsplit('.')
        .next()
        .unwrap_or_default();
    let document = attachment.one("document")?;
    let investigation = document.one("investigation")?;
    let file_name = safe_name(&format!(
        "{} - {}.{}",
        document.str_field("title")?.trim(),
        attachment.str_field("title")?,
        extension
    ));
    let cached = cache_dir
        .join("itc_edis")
        .join(safe_name(investigation.str_field("number")?))
        .join(file_name);
    fetch_once(&cached, dest_dir, |path| client.download(url, path))
}
