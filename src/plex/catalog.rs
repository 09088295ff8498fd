use std::collections::BTreeMap;
use std::io::Read;

use anyhow::{Context, Result, bail, ensure};
use flate2::read::GzDecoder;
use tracing::{info, instrument};

use crate::plex::structs::{CatalogDocument, Channel, RawChannel};
use crate::plex::{FALLBACK_LOGO, WATCH_PAGE_BASE};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Fetches the channel catalog and normalizes it into one ordered list.
///
/// # Errors
/// Errors on network failure, non-success status, undecodable bodies or a
/// document matching none of the known shapes. A broken catalog aborts the
/// run; there is nothing to resolve without one.
#[instrument(skip(client))]
pub async fn fetch_catalog(
    client: &reqwest::Client,
    url: &str,
    region: &str,
) -> Result<Vec<Channel>> {
    let req = client
        .get(url)
        .send()
        .await
        .context("Fetching channel catalog")?;
    ensure!(
        req.status().is_success(),
        "Catalog endpoint returned {}",
        req.status()
    );

    let body = req.bytes().await.context("Reading channel catalog")?;
    let channels = parse_catalog(&body, region)?;
    info!("Loaded {} channels from catalog", channels.len());

    Ok(channels)
}

/// Decodes a catalog body (plain or gzip-compressed JSON) into channels.
pub fn parse_catalog(body: &[u8], region: &str) -> Result<Vec<Channel>> {
    let text = if body.starts_with(&GZIP_MAGIC) {
        let mut decoded = String::new();
        GzDecoder::new(body)
            .read_to_string(&mut decoded)
            .context("Decompressing channel catalog")?;
        decoded
    } else {
        std::str::from_utf8(body)
            .context("Decoding channel catalog")?
            .to_string()
    };

    let document: CatalogDocument =
        serde_json::from_str(&text).context("Catalog document matches no known shape")?;

    normalize(document, region)
}

fn normalize(document: CatalogDocument, region: &str) -> Result<Vec<Channel>> {
    match document {
        CatalogDocument::Regions { regions } => {
            let Some(scoped) = regions.get(region) else {
                bail!("Catalog has no channel list for region `{region}`")
            };
            Ok(from_map(&scoped.channels))
        }
        CatalogDocument::Channels { channels } => Ok(from_map(&channels)),
        CatalogDocument::Flat(list) => Ok(list
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let id = raw
                    .id
                    .clone()
                    .or_else(|| raw.slug.clone())
                    .unwrap_or_else(|| format!("channel-{i}"));
                from_raw(id, raw)
            })
            .collect()),
    }
}

fn from_map(channels: &BTreeMap<String, RawChannel>) -> Vec<Channel> {
    channels
        .iter()
        .map(|(id, raw)| from_raw(id.clone(), raw.clone()))
        .collect()
}

fn from_raw(id: String, raw: RawChannel) -> Channel {
    let source = raw
        .url
        .or_else(|| raw.slug.map(|s| format!("{WATCH_PAGE_BASE}/{s}")))
        .unwrap_or_else(|| format!("{WATCH_PAGE_BASE}/{id}"));

    Channel {
        name: raw.name.unwrap_or_else(|| format!("Channel {id}")),
        logo: raw.logo.unwrap_or_else(|| FALLBACK_LOGO.to_string()),
        group: raw.group.unwrap_or_else(|| "Uncategorized".to_string()),
        source,
        id,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_flat_array() {
        let body = br#"[{"id": "one", "name": "One", "url": "https://watch.plex.tv/live-tv/channel/one"}]"#;
        let channels = parse_catalog(body, "us").unwrap();

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, "one");
        assert_eq!(channels[0].name, "One");
        assert_eq!(channels[0].slug(), "one");
    }

    #[test]
    fn parses_channels_map_with_defaults() {
        let body = br#"{"channels": {"c1": {"name": "Test", "url": "http://x/stream.m3u8"}}}"#;
        let channels = parse_catalog(body, "us").unwrap();

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, "c1");
        assert_eq!(channels[0].name, "Test");
        assert_eq!(channels[0].source, "http://x/stream.m3u8");
        assert_eq!(channels[0].logo, FALLBACK_LOGO);
        assert_eq!(channels[0].group, "Uncategorized");
    }

    #[test]
    fn prefers_requested_region() {
        let body = br#"{
            "regions": {
                "gb": {"channels": {"uk1": {"name": "UK One"}}},
                "us": {"channels": {"us1": {"name": "US One"}}}
            }
        }"#;
        let channels = parse_catalog(body, "us").unwrap();

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "US One");
    }

    #[test]
    fn missing_region_is_an_error() {
        let body = br#"{"regions": {"gb": {"channels": {}}}}"#;
        assert!(parse_catalog(body, "us").is_err());
    }

    #[test]
    fn map_order_is_deterministic() {
        let body = br#"{"channels": {"b": {"name": "B"}, "a": {"name": "A"}, "c": {"name": "C"}}}"#;
        let channels = parse_catalog(body, "us").unwrap();
        let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();

        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn decodes_gzip_bodies() {
        let json = br#"{"channels": {"c1": {"name": "Zipped"}}}"#;
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(json).unwrap();
        let body = encoder.finish().unwrap();

        let channels = parse_catalog(&body, "us").unwrap();
        assert_eq!(channels[0].name, "Zipped");
    }

    #[test]
    fn unknown_shape_is_an_error() {
        assert!(parse_catalog(br#"{"lineup": []}"#, "us").is_err());
        assert!(parse_catalog(b"not json at all", "us").is_err());
    }

    #[test]
    fn slug_without_url_falls_back_to_id() {
        let body = br#"{"channels": {"go-wild": {"name": "Go Wild"}}}"#;
        let channels = parse_catalog(body, "us").unwrap();

        assert_eq!(channels[0].slug(), "go-wild");
        assert!(channels[0].source.starts_with(WATCH_PAGE_BASE));
    }
}
