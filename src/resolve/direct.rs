use anyhow::Result;
use async_trait::async_trait;

use crate::plex::structs::Channel;
use crate::resolve::{ResolveStrategy, probe};

/// Known CDN locations serving `master.m3u8`, keyed by channel slug.
const STREAM_URL_PATTERNS: &[&str] = &[
    "https://epg.provider.plex.tv/streams/{slug}/master.m3u8",
    "https://epg.provider.plex.tv/channels/{slug}/master.m3u8",
];

/// Builds candidate stream URLs from the channel slug and accepts the first
/// one whose probe returns 200. The cheapest strategy; no page fetch at all.
pub struct DirectProbe;

#[async_trait]
impl ResolveStrategy for DirectProbe {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn resolve(
        &self,
        client: &reqwest::Client,
        channel: &Channel,
        token: &str,
    ) -> Result<Option<String>> {
        let slug = channel.slug();

        for pattern in STREAM_URL_PATTERNS {
            let candidate = format!("{}?X-Plex-Token={token}", pattern.replace("{slug}", slug));
            if probe(client, &candidate, token).await {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}
