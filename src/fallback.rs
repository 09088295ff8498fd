use anyhow::{Context, Result, ensure};
use tracing::{error, info, instrument};

/// iptv-org's pre-built Plex playlist; cross-reference source and fallback
/// of last resort.
pub const AGGREGATOR_PLAYLIST_URL: &str =
    "https://raw.githubusercontent.com/iptv-org/iptv/master/streams/us_plex.m3u";

/// Emitted when even the aggregator playlist cannot be fetched, so the tool
/// always produces a non-empty output file.
pub const ERROR_PLACEHOLDER: &str = "#EXTM3U\n#EXTINF:-1 tvg-id=\"error\" tvg-name=\"Playlist unavailable\",Playlist unavailable - check logs\nhttp://127.0.0.1/unavailable.m3u8\n";

/// Fetches the aggregator playlist verbatim. Never fails; a broken fetch
/// degrades to the hard-coded single-entry placeholder.
#[instrument(skip(client))]
pub async fn fetch_fallback(client: &reqwest::Client, url: &str) -> String {
    match try_fetch(client, url).await {
        Ok(text) => {
            info!("Using fallback playlist from {url}");
            text
        }
        Err(e) => {
            error!("Fallback playlist fetch failed: {e:#}");
            ERROR_PLACEHOLDER.to_string()
        }
    }
}

async fn try_fetch(client: &reqwest::Client, url: &str) -> Result<String> {
    let res = client
        .get(url)
        .send()
        .await
        .context("Fetching fallback playlist")?;
    ensure!(
        res.status().is_success(),
        "Fallback endpoint returned {}",
        res.status()
    );

    let text = res.text().await.context("Decoding fallback playlist")?;
    ensure!(!text.trim().is_empty(), "Fallback playlist is empty");

    Ok(text)
}
