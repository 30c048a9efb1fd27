use crate::target::Target;
use crate::transport::DISCOVERY_TIMEOUT;
use reqwest::Client;
use tracing::{debug, error, info, warn};
use url::Url;

/// Candidate endpoint paths, tried in this order.
pub const AURA_PATHS: [&str; 4] = ["aura", "s/aura", "s/sfsites/aura", "sfsites/aura"];

/// Present in the framework's reply to an Aura POST without a session.
pub const INVALID_SESSION_MARKER: &str = "aura:invalidSession";

/// POST an empty body to each candidate until one answers with the
/// invalid-session marker. Connection failures only skip the candidate.
pub async fn discover(client: &Client, target: &Target) -> Option<Url> {
    info!("Looking for Aura endpoints on {}", target);

    for path in AURA_PATHS {
        let endpoint = match target.join(path) {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping candidate {}: {}", path, e);
                continue;
            }
        };

        debug!("Probing {}", endpoint);
        match probe(client, &endpoint).await {
            Ok(true) => {
                info!("Found vulnerable endpoint: {}", endpoint);
                return Some(endpoint);
            }
            Ok(false) => debug!("{} did not answer like an Aura endpoint", endpoint),
            Err(e) => warn!("Failed to connect to {}: {}", endpoint, e),
        }
    }

    error!("No vulnerable Aura endpoints found on {}", target);
    None
}

async fn probe(client: &Client, endpoint: &Url) -> reqwest::Result<bool> {
    let body = client
        .post(endpoint.clone())
        .timeout(DISCOVERY_TIMEOUT)
        .send()
        .await?
        .text()
        .await?;

    Ok(body.contains(INVALID_SESSION_MARKER))
}
