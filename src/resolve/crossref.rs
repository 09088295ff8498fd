use std::collections::HashMap;

use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::playlist;
use crate::plex::structs::Channel;
use crate::resolve::ResolveStrategy;

/// Looks channels up by display name in an aggregator's pre-built playlist.
///
/// The aggregator validates its URLs on its own schedule, so a hit is
/// accepted without a separate probe. The playlist is fetched at most once
/// per run; a failed fetch is cached as an empty map so every later lookup
/// misses without re-issuing the request.
pub struct CrossReference {
    playlist_url: String,
    entries: OnceCell<HashMap<String, String>>,
}

impl CrossReference {
    #[must_use]
    pub fn new(playlist_url: impl Into<String>) -> Self {
        Self {
            playlist_url: playlist_url.into(),
            entries: OnceCell::new(),
        }
    }

    #[instrument(skip(self, client))]
    async fn entries(&self, client: &reqwest::Client) -> &HashMap<String, String> {
        self.entries
            .get_or_init(|| async {
                match fetch_entries(client, &self.playlist_url).await {
                    Ok(entries) => {
                        info!("Aggregator playlist carries {} channels", entries.len());
                        entries
                    }
                    Err(e) => {
                        warn!("Aggregator playlist unavailable, disabling cross-reference: {e:#}");
                        HashMap::new()
                    }
                }
            })
            .await
    }
}

async fn fetch_entries(
    client: &reqwest::Client,
    url: &str,
) -> Result<HashMap<String, String>> {
    let res = client
        .get(url)
        .send()
        .await
        .context("Fetching aggregator playlist")?;
    ensure!(
        res.status().is_success(),
        "Aggregator playlist returned {}",
        res.status()
    );

    let text = res.text().await.context("Decoding aggregator playlist")?;

    Ok(playlist::parse_playlist(&text))
}

#[async_trait]
impl ResolveStrategy for CrossReference {
    fn name(&self) -> &'static str {
        "crossref"
    }

    async fn resolve(
        &self,
        client: &reqwest::Client,
        channel: &Channel,
        _token: &str,
    ) -> Result<Option<String>> {
        Ok(self.entries(client).await.get(&channel.name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> Channel {
        Channel {
            id: "c1".to_string(),
            name: "Channel One".to_string(),
            logo: String::new(),
            group: "Test".to_string(),
            source: "https://watch.plex.tv/live-tv/channel/channel-one".to_string(),
        }
    }

    #[tokio::test]
    async fn fetch_failure_is_cached_as_an_empty_map() {
        // .invalid never resolves, so the first lookup fails fast
        let strategy = CrossReference::new("http://aggregator.invalid/plex.m3u");
        let client = reqwest::Client::new();

        assert!(strategy.entries.get().is_none());

        let first = strategy.resolve(&client, &channel(), "token").await.unwrap();
        assert_eq!(first, None);

        // the failed fetch left a cached empty map behind; later channels
        // miss against it instead of re-issuing the request
        assert_eq!(strategy.entries.get().map(HashMap::len), Some(0));

        let second = strategy.resolve(&client, &channel(), "token").await.unwrap();
        assert_eq!(second, None);
    }
}
