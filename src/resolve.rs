use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::ValueEnum;
use tracing::{debug, info, instrument, warn};

use crate::plex::structs::Channel;

pub mod crossref;
pub mod direct;
pub mod rendered;
pub mod scrape;

/// Per-candidate existence check budget.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// One heuristic for locating a playable stream URL for a channel.
///
/// Strategies are tried in order per channel; the first URL wins.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means this strategy found nothing for the channel. `Err` is
    /// treated the same by the pipeline, with a louder log line.
    async fn resolve(
        &self,
        client: &reqwest::Client,
        channel: &Channel,
        token: &str,
    ) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Template the channel slug into known CDN URL patterns and probe
    Direct,
    /// Scrape the channel page HTML for `.m3u8` URLs and probe
    Scrape,
    /// Scrape, but render the page in headless Chromium first
    Rendered,
    /// Look the channel name up in the aggregator playlist
    Crossref,
}

#[must_use]
pub fn build_strategies(
    kinds: &[StrategyKind],
    aggregator_url: &str,
) -> Vec<Box<dyn ResolveStrategy>> {
    kinds
        .iter()
        .map(|kind| match kind {
            StrategyKind::Direct => Box::new(direct::DirectProbe) as Box<dyn ResolveStrategy>,
            StrategyKind::Scrape => Box::new(scrape::ScrapeProbe) as Box<dyn ResolveStrategy>,
            StrategyKind::Rendered => {
                Box::new(rendered::RenderedScrape) as Box<dyn ResolveStrategy>
            }
            StrategyKind::Crossref => {
                Box::new(crossref::CrossReference::new(aggregator_url)) as Box<dyn ResolveStrategy>
            }
        })
        .collect()
}

/// Resolves channels one at a time, in catalog order.
///
/// Per-channel failures never abort the run; an unresolved channel is simply
/// absent from the returned map. `limit` caps how many channels are probed,
/// trading completeness for run time.
pub async fn resolve_streams(
    client: &reqwest::Client,
    channels: &[Channel],
    token: &str,
    strategies: &[Box<dyn ResolveStrategy>],
    limit: Option<usize>,
) -> HashMap<String, String> {
    let mut streams = HashMap::new();
    let attempted = limit.unwrap_or(channels.len()).min(channels.len());

    for channel in &channels[..attempted] {
        if let Some(url) = resolve_channel(client, channel, token, strategies).await {
            streams.insert(channel.source.clone(), url);
        } else {
            debug!("No stream found for {}", channel.name);
        }
    }

    info!("Resolved {} of {attempted} channels", streams.len());
    streams
}

async fn resolve_channel(
    client: &reqwest::Client,
    channel: &Channel,
    token: &str,
    strategies: &[Box<dyn ResolveStrategy>],
) -> Option<String> {
    for strategy in strategies {
        match strategy.resolve(client, channel, token).await {
            Ok(Some(url)) => {
                info!("Resolved {} via {}: {url}", channel.name, strategy.name());
                return Some(url);
            }
            Ok(None) => {}
            Err(e) => warn!(
                "Strategy {} failed for {}: {e:#}",
                strategy.name(),
                channel.name
            ),
        }
    }

    None
}

/// HEAD probe against a candidate URL. Only a 200 keeps the candidate; any
/// other status or transport error discards it for the rest of the run.
#[instrument(skip(client, token))]
pub async fn probe(client: &reqwest::Client, url: &str, token: &str) -> bool {
    let res = client
        .head(url)
        .header("X-Plex-Token", token)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await;

    match res {
        Ok(res) if res.status() == reqwest::StatusCode::OK => {
            debug!("Found valid stream: {url}");
            true
        }
        Ok(res) => {
            debug!("Stream {url} returned {}", res.status());
            false
        }
        Err(e) => {
            debug!("Stream {url} failed: {e}");
            false
        }
    }
}
