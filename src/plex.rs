pub mod catalog;
pub mod structs;
pub mod token;

/// matthuisman's mirror of the Plex live TV lineup, gzip-compressed JSON.
pub const DEFAULT_CATALOG_URL: &str = "https://i.mjh.nz/Plex/.channels.json.gz";

/// EPG source advertised in the generated playlist header.
pub const DEFAULT_EPG_URL: &str = "https://i.mjh.nz/Plex/all.xml.gz";

/// Logo used for channels whose catalog entry carries none.
pub const FALLBACK_LOGO: &str = "https://provider-static.plex.tv/epg/images/default-logo.png";

/// Public channel page, keyed by slug.
pub const WATCH_PAGE_BASE: &str = "https://watch.plex.tv/live-tv/channel";
