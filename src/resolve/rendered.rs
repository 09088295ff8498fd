use std::io::ErrorKind;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::debug;

use crate::plex::structs::Channel;
use crate::resolve::scrape::ScrapeProbe;
use crate::resolve::{ResolveStrategy, probe};

/// Like [`ScrapeProbe`], but renders the page in headless Chromium first so
/// script-injected player markup is present in the scraped DOM.
pub struct RenderedScrape;

/// Renders a page and returns the settled DOM
async fn render_page(url: &str) -> Result<String> {
    let child = match tokio::process::Command::new("chromium")
        .args([
            "--headless",
            "--disable-gpu",
            "--no-sandbox",
            "--virtual-time-budget=10000",
            "--dump-dom",
            url,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            bail!("`chromium` is not installed or available in PATH!")
        }
        Err(e) => bail!("Unknown error: {e}"),
    };

    let out = child
        .wait_with_output()
        .await
        .context("Rendering channel page")?;
    if !out.status.success() {
        bail!("Chromium exited with {}", out.status);
    }

    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

#[async_trait]
impl ResolveStrategy for RenderedScrape {
    fn name(&self) -> &'static str {
        "rendered"
    }

    async fn resolve(
        &self,
        client: &reqwest::Client,
        channel: &Channel,
        token: &str,
    ) -> Result<Option<String>> {
        let html = render_page(&channel.source).await?;
        debug!("Rendered {} bytes of DOM for {}", html.len(), channel.name);

        for candidate in ScrapeProbe::extract_candidates(&html) {
            let candidate = format!("{candidate}?X-Plex-Token={token}");
            if probe(client, &candidate, token).await {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}
