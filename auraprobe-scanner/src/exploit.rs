use crate::bootstrap::AuraContext;
use crate::error::{Result, ScanError};
use crate::protocol::ActionResponse;
use crate::transport::EXPLOIT_TIMEOUT;
use reqwest::Client;
use tracing::{debug, error};
use url::Url;

const EXPLOIT_QUERY: &str = "r=1&applauncher.LoginForm.getLoginRightFrameUrl=1";
const SNIPPET_CHARS: usize = 200;

/// POST one action envelope to the endpoint as a guest and decode the reply.
///
/// The response is returned as-is: `state`, `error` and `exceptionEvent`
/// are left for the caller because their meaning differs per action.
pub async fn execute(
    client: &Client,
    endpoint: Option<&Url>,
    context: Option<&AuraContext>,
    message: &str,
) -> Result<ActionResponse> {
    let (Some(endpoint), Some(context)) = (endpoint, context) else {
        error!("Aura endpoint or context not set. Cannot send action.");
        return Err(ScanError::NotBootstrapped);
    };

    let mut url = endpoint.clone();
    url.set_query(Some(EXPLOIT_QUERY));

    let context_json = context.to_json();
    let form = [
        ("message", message),
        ("aura.context", context_json.as_str()),
        ("aura.token", "undefined"),
    ];

    debug!("POST {} ({} byte message)", url, message.len());
    let response = client
        .post(url.clone())
        .form(&form)
        .timeout(EXPLOIT_TIMEOUT)
        .send()
        .await
        .inspect_err(|e| error!("HTTP request to {} failed: {}", url, e))?;

    let status = response.status();
    if !status.is_success() {
        error!("HTTP request to {} failed with status {}", url, status);
        return Err(ScanError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    decode_response(&body)
}

/// Decode an action response, keeping only a short prefix of a bad body.
pub fn decode_response(body: &str) -> Result<ActionResponse> {
    serde_json::from_str(body).map_err(|e| {
        let snippet = truncate(body, SNIPPET_CHARS);
        error!("Failed to decode JSON from response ({}): {}...", e, snippet);
        ScanError::Decode { snippet }
    })
}

fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
