//! Getting generated content out of the studio

use futures::StreamExt;
use reqwest::Client as HttpClient;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::error::{Result, StudioError};
use crate::util::excerpt;

/// File name used when the user does not pick one
pub const DEFAULT_IMAGE_FILE: &str = "linkedin-image.png";

pub fn default_image_path() -> PathBuf {
    PathBuf::from(DEFAULT_IMAGE_FILE)
}

/// Put `text` on the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| StudioError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| StudioError::Clipboard(e.to_string()))?;
    crate::debug_log!("Copied {} characters to clipboard", text.chars().count());
    Ok(())
}

/// Fetch the image at `url` into `path`. Returns the number of bytes written.
pub async fn download_image(client: &HttpClient, url: &str, path: &Path) -> Result<u64> {
    let url = url.trim();
    if url.is_empty() {
        return Err(StudioError::InvalidInput {
            message: "no image to download".to_string(),
        });
    }

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StudioError::Backend {
            status: Some(status.as_u16()),
            message: format!("image download returned {}: {}", status, excerpt(&body, 200)),
        });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let written = match write_body(response, path).await {
        Ok(written) => written,
        Err(err) => {
            crate::warn_log!("Image download to {} failed: {}", path.display(), err);
            let _ = tokio::fs::remove_file(path).await;
            return Err(err);
        }
    };

    crate::info_log!("Saved image {} to {} ({} bytes)", url, path.display(), written);
    Ok(written)
}

async fn write_body(response: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
