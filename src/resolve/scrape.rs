use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::plex::structs::Channel;
use crate::resolve::{ResolveStrategy, probe};

/// Permissive on purpose; candidates are validated by probing anyway.
pub static STREAM_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'\\]+\.m3u8"#).unwrap());

/// The channel page serves a consent wall to unknown agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Fetches the channel page and probes every `.m3u8` URL found in its HTML.
pub struct ScrapeProbe;

impl ScrapeProbe {
    /// Extracts `.m3u8` candidates from page markup, in document order.
    #[must_use]
    pub fn extract_candidates(html: &str) -> Vec<String> {
        STREAM_URL_REGEX
            .find_iter(html)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

#[async_trait]
impl ResolveStrategy for ScrapeProbe {
    fn name(&self) -> &'static str {
        "scrape"
    }

    async fn resolve(
        &self,
        client: &reqwest::Client,
        channel: &Channel,
        token: &str,
    ) -> Result<Option<String>> {
        let res = client
            .get(&channel.source)
            .header("User-Agent", BROWSER_USER_AGENT)
            .header("X-Plex-Token", token)
            .send()
            .await
            .context("Fetching channel page")?;
        let html = res.text().await.context("Decoding channel page")?;

        let candidates = Self::extract_candidates(&html);
        if candidates.is_empty() {
            debug!("No .m3u8 URL found in {}", channel.source);
        }

        for candidate in candidates {
            let candidate = format!("{candidate}?X-Plex-Token={token}");
            if probe(client, &candidate, token).await {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_candidates_in_document_order() {
        let html = r#"<html><script>var a = "https://cdn.example/one/master.m3u8";</script>
            <video src='http://cdn.example/two/index.m3u8'></video></html>"#;

        let candidates = ScrapeProbe::extract_candidates(html);
        assert_eq!(
            candidates,
            [
                "https://cdn.example/one/master.m3u8",
                "http://cdn.example/two/index.m3u8"
            ]
        );
    }

    #[test]
    fn ignores_markup_without_streams() {
        let html = "<html><body>nothing to see</body></html>";
        assert!(ScrapeProbe::extract_candidates(html).is_empty());
    }

    #[test]
    fn stops_at_quotes_and_whitespace() {
        let html = r#"{"stream":"https://cdn.example/a.m3u8","next":"x"}"#;
        assert_eq!(
            ScrapeProbe::extract_candidates(html),
            ["https://cdn.example/a.m3u8"]
        );
    }
}
