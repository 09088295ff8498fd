use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::playlist;

/// Overwrites the playlist file in place. No atomic-write or backup
/// discipline; a partial write on crash is acceptable for this tool.
pub async fn write_playlist(path: &Path, text: &str) -> Result<()> {
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("Writing playlist to {}", path.display()))?;

    info!(
        "Wrote {} entries to {}",
        playlist::entry_count(text),
        path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overwrites_prior_content() {
        let path = std::env::temp_dir().join("plexm3u-output-test.m3u");

        write_playlist(&path, "#EXTM3U\nold content that is longer\n")
            .await
            .unwrap();
        write_playlist(&path, "#EXTM3U\n").await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "#EXTM3U\n");

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
