use anyhow::{Context, Result, bail};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::plex::structs::SignInResponse;

const SIGN_IN_URL: &str = "https://plex.tv/api/v2/users/anonymous";

// Client metadata mirroring what the web player sends.
const PRODUCT: &str = "Plex Web";
const VERSION: &str = "4.145.1";
const PLATFORM: &str = "Chrome";
const PLATFORM_VERSION: &str = "123.0";
const DEVICE: &str = "Linux";

/// Spoofed origin addresses, used to pin the issued token to a region.
const REGION_FORWARDED_FOR: &[(&str, &str)] = &[
    ("us", "185.236.200.172"),
    ("gb", "178.238.11.6"),
    ("ca", "192.206.151.131"),
    ("de", "85.214.132.117"),
];

#[must_use]
pub fn forwarded_for(region: &str) -> Option<&'static str> {
    REGION_FORWARDED_FOR
        .iter()
        .find(|(cc, _)| *cc == region)
        .map(|(_, ip)| *ip)
}

/// Obtains a disposable access token via anonymous sign-in.
///
/// A `PLEX_TOKEN` env var short-circuits the request. The token is valid for
/// this run only; there is no refresh.
///
/// # Errors
/// Errors on transport failure or a non-success status. Callers degrade to
/// the fallback playlist rather than abort.
#[instrument(skip(client))]
pub async fn anonymous_sign_in(client: &reqwest::Client, region: &str) -> Result<String> {
    if let Ok(token) = std::env::var("PLEX_TOKEN") {
        info!("Using access token from PLEX_TOKEN");
        return Ok(token);
    }

    let client_id = Uuid::new_v4().to_string();
    let mut req = client
        .post(SIGN_IN_URL)
        .header("Accept", "application/json")
        .query(&[
            ("X-Plex-Product", PRODUCT),
            ("X-Plex-Version", VERSION),
            ("X-Plex-Client-Identifier", client_id.as_str()),
            ("X-Plex-Platform", PLATFORM),
            ("X-Plex-Platform-Version", PLATFORM_VERSION),
            ("X-Plex-Device", DEVICE),
            ("X-Plex-Model", "hosted"),
            ("X-Plex-Language", "en"),
        ]);

    if let Some(ip) = forwarded_for(region) {
        req = req.header("X-Forwarded-For", ip);
    } else {
        debug!("No spoofed origin address for region `{region}`");
    }

    let res = req.send().await.context("Requesting anonymous sign-in")?;
    if !res.status().is_success() {
        bail!("Anonymous sign-in returned {}", res.status());
    }

    let body = res
        .json::<SignInResponse>()
        .await
        .context("Parsing anonymous sign-in response")?;
    debug!("Anonymous sign-in succeeded");

    Ok(body.auth_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_regions_have_an_origin_address() {
        assert!(forwarded_for("us").is_some());
        assert!(forwarded_for("gb").is_some());
        assert!(forwarded_for("nz").is_none());
    }
}
