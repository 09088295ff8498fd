use std::collections::BTreeMap;

use serde::Deserialize;

/// One live TV channel, normalized from whichever catalog shape was served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub logo: String,
    pub group: String,
    /// Page URL (or raw identifier) candidate stream URLs are derived from.
    pub source: String,
}

impl Channel {
    /// Last path segment of the source reference, e.g. `go-wild`.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.source
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.source)
    }
}

/// Channel entry as it appears in any of the known catalog documents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChannel {
    pub id: Option<String>,
    pub name: Option<String>,
    pub logo: Option<String>,
    #[serde(alias = "genre", alias = "group-title")]
    pub group: Option<String>,
    pub url: Option<String>,
    pub slug: Option<String>,
}

/// Channel list scoped to one region.
#[derive(Debug, Deserialize)]
pub struct RegionChannels {
    #[serde(default)]
    pub channels: BTreeMap<String, RawChannel>,
}

/// The three catalog shapes observed in the wild. `BTreeMap` keeps map-shaped
/// documents in key order so output is deterministic run-to-run.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CatalogDocument {
    Regions {
        regions: BTreeMap<String, RegionChannels>,
    },
    Channels {
        channels: BTreeMap<String, RawChannel>,
    },
    Flat(Vec<RawChannel>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub auth_token: String,
}
