use reqwest::Url;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Result, TextbookError};

/// File name of the archive behind `url`: its last non-empty path segment.
pub fn archive_file_name(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| TextbookError::InvalidMetadata(format!("bad url {:?}: {}", url, e)))?;
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string())
        .ok_or_else(|| TextbookError::InvalidMetadata(format!("url has no file name: {:?}", url)))
}

/// Reject override names that would leave the download directory.
fn checked_file_name(name: &str) -> Result<String> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(TextbookError::InvalidMetadata(format!(
            "archive file name must be a plain file name: {:?}",
            name
        )));
    }
    Ok(name.to_string())
}

/// Write `content` to `partial`, then move it to `path`. The partial file is
/// removed when either step fails.
fn store_file(partial: &Path, path: &Path, content: &[u8]) -> Result<()> {
    if let Err(e) = fs::write(partial, content).and_then(|_| fs::rename(partial, path)) {
        if partial.exists() {
            if let Err(cleanup) = fs::remove_file(partial) {
                warn!("Could not remove partial download {:?}: {}", partial, cleanup);
            }
        }
        return Err(e.into());
    }
    Ok(())
}

/// Download `url` into `dir`, unless the target file already exists.
///
/// The target is `dir/<file_name>`, with the name taken from the URL when no
/// override is given. Returns the absolute path of the local archive.
pub fn download_archive(url: &str, dir: &Path, file_name: Option<&str>) -> Result<PathBuf> {
    let file_name = match file_name {
        Some(name) => checked_file_name(name)?,
        None => archive_file_name(url)?,
    };

    fs::create_dir_all(dir)?;
    let path = fs::canonicalize(dir)?.join(&file_name);

    if path.exists() {
        info!("Archive already present, skipping download: {:?}", path);
        return Ok(path);
    }

    info!("Downloading {} ...", url);
    let response = reqwest::blocking::get(url)?;
    if !response.status().is_success() {
        return Err(TextbookError::Http {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    let content = response.bytes()?;

    let partial = path.with_file_name(format!("{}.part", file_name));
    store_file(&partial, &path, &content)?;

    info!(
        "Downloaded {} ({:.1} MB) to {:?}",
        file_name,
        content.len() as f64 / 1_048_576.0,
        path
    );
    Ok(path)
}
