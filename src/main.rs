#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{info, warn};

use resolve::StrategyKind;

pub mod fallback;
pub mod output;
pub mod playlist;
pub mod plex;
pub mod resolve;

/// Generates an M3U playlist of Plex's free live TV channels
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Two-letter region code for catalog scoping and token spoofing
    #[arg(short, long, default_value = "us")]
    region: String,

    /// Channel catalog URL (plain or gzip-compressed JSON)
    #[arg(long, default_value = plex::DEFAULT_CATALOG_URL)]
    catalog_url: String,

    /// Aggregator playlist used for cross-referencing and as fallback
    #[arg(long, default_value = fallback::AGGREGATOR_PLAYLIST_URL)]
    aggregator_url: String,

    /// EPG source advertised in the playlist header
    #[arg(long, default_value = plex::DEFAULT_EPG_URL)]
    epg_url: String,

    /// Resolution strategies, tried per channel in the given order
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_value = "direct,scrape,crossref"
    )]
    strategies: Vec<StrategyKind>,

    /// Only probe the first N channels (keeps run time bounded)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Output playlist path
    #[arg(short, long, default_value = "plex.m3u")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let client = init_http_client();

    info!("Generating playlist for region `{}`", args.region);
    let channels = plex::catalog::fetch_catalog(&client, &args.catalog_url, &args.region).await?;

    let text = match plex::token::anonymous_sign_in(&client, &args.region).await {
        Ok(token) => {
            let strategies = resolve::build_strategies(&args.strategies, &args.aggregator_url);
            let streams =
                resolve::resolve_streams(&client, &channels, &token, &strategies, args.limit).await;

            let built = playlist::build_playlist(&channels, &streams, Some(&args.epg_url));
            playlist::finalize(built, || {
                fallback::fetch_fallback(&client, &args.aggregator_url)
            })
            .await
        }
        Err(e) => {
            warn!("Anonymous sign-in failed ({e:#}); using fallback playlist");
            fallback::fetch_fallback(&client, &args.aggregator_url).await
        }
    };

    output::write_playlist(&args.output, &text).await?;
    info!("All done!");

    Ok(())
}

fn init_http_client() -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        "User-Agent",
        HeaderValue::from_str(&format!(
            "{}/{} (+{})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_REPOSITORY")
        ))
        .expect("Unable to build User-Agent header"),
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .expect("Unable to build HTTP client")
}
