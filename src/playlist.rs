use std::collections::HashMap;
use std::fmt::Write;
use std::future::Future;

use tracing::warn;

use crate::plex::structs::Channel;

/// Builds the output playlist, preserving catalog order. Channels without a
/// resolved stream are skipped entirely; there are no placeholder entries.
#[must_use]
pub fn build_playlist(
    channels: &[Channel],
    streams: &HashMap<String, String>,
    epg_url: Option<&str>,
) -> String {
    let mut out = match epg_url {
        Some(epg) => format!("#EXTM3U x-tvg-url=\"{epg}\"\n"),
        None => String::from("#EXTM3U\n"),
    };

    for channel in channels {
        let Some(url) = streams.get(&channel.source) else {
            continue;
        };

        // writeln! to a String is infallible
        let _ = writeln!(
            out,
            "#EXTINF:-1 tvg-id=\"{}\" tvg-name=\"{}\" tvg-logo=\"{}\" group-title=\"{}\",{}",
            sanitize(&channel.id),
            sanitize(&channel.name),
            sanitize(&channel.logo),
            sanitize(&channel.group),
            channel.name,
        );
        out.push_str(url);
        out.push('\n');
    }

    out
}

/// Replaces a zero-entry playlist with the fallback document, so the bare
/// `#EXTM3U` header is never what gets written. The fallback is only
/// fetched when actually needed.
pub async fn finalize<F, Fut>(built: String, fallback: F) -> String
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = String>,
{
    if entry_count(&built) == 0 {
        warn!("No channels resolved; using fallback playlist");
        fallback().await
    } else {
        built
    }
}

/// Number of entries in a playlist document. Emptiness is judged on the
/// built output, not on the stream map.
#[must_use]
pub fn entry_count(playlist: &str) -> usize {
    playlist
        .lines()
        .filter(|l| l.trim_start().starts_with("#EXTINF"))
        .count()
}

// Embedded double quotes would break the attribute syntax.
fn sanitize(value: &str) -> String {
    value.replace('"', "")
}

/// Parses an aggregator playlist into a display-name → URL map.
///
/// The name is taken as everything after the EXTINF line's last comma, the
/// same way the playlists this tool consumes emit it. Other directives
/// between an EXTINF line and its URL are skipped.
#[must_use]
pub fn parse_playlist(text: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    let mut pending: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();

        if let Some(info) = line.strip_prefix("#EXTINF") {
            pending = info
                .rsplit(',')
                .next()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty());
        } else if line.is_empty() || line.starts_with('#') {
            // keep the pending name across interleaved directives
        } else if let Some(name) = pending.take() {
            entries.insert(name, line.to_string());
        }
    }

    entries
}
