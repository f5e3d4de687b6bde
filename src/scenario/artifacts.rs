use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::browser::PageDriver;

/// Save a PNG of the current page as `<dir>/<capability>-failure.png`.
pub async fn capture_failure(
    driver: &dyn PageDriver,
    dir: &Path,
    capability: &str,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let png = driver.screenshot().await?;
    let path = dir.join(format!("{}-failure.png", capability));
    tokio::fs::write(&path, png)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// First `max_chars` characters of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
