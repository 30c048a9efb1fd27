//! Aura context bootstrap.
//!
//! Salesforce sites inline the framework bootstrap data in the landing page,
//! either as plain JSON fragments or percent-encoded inside a
//! `/s/sfsites/l/<...>/` resource path. The tokens are pulled out with
//! patterns rather than a parser because the page is rarely clean JSON.

use crate::error::{Result, ScanError};
use crate::target::Target;
use crate::transport::BOOTSTRAP_TIMEOUT;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, error, info};
use url::Url;

static REDIRECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"window\.location\.href\s*=\s*'([^']+)'").expect("valid regex"));
static ENCODED_BLOB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/s/sfsites/l/([^/]+fwuid[^/]+)").expect("valid regex"));
static FWUID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""fwuid":"([^"]+)"#).expect("valid regex"));
static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(APPLICATION@markup[^"]+)":"([^"]+)""#).expect("valid regex")
});
static APP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""app":"([^"]+)"#).expect("valid regex"));

/// The serialized context every Aura action request must carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuraContext {
    pub mode: String,
    pub fwuid: String,
    pub app: String,
    pub loaded: BTreeMap<String, String>,
    pub dn: Vec<Value>,
    pub globals: Map<String, Value>,
    pub uad: bool,
}

impl AuraContext {
    pub fn from_tokens(tokens: ContextTokens) -> Self {
        let mut loaded = BTreeMap::new();
        loaded.insert(tokens.markup_key, tokens.markup_value);

        Self {
            mode: "PROD".to_string(),
            fwuid: tokens.fwuid,
            app: tokens.app,
            loaded,
            dn: Vec::new(),
            globals: Map::new(),
            uad: false,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Raw tokens scraped from one bootstrap response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextTokens {
    pub fwuid: String,
    pub markup_key: String,
    pub markup_value: String,
    pub app: String,
}

/// Strategy for pulling context tokens out of a landing page body.
pub trait ContextExtractor: Send + Sync {
    fn extract(&self, body: &str) -> Result<ContextTokens>;
}

/// Pattern matching over the body, decoding the `/s/sfsites/l/` blob first
/// when the page references one.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl ContextExtractor for PatternExtractor {
    fn extract(&self, body: &str) -> Result<ContextTokens> {
        let search_body = decode_embedded_blob(body).unwrap_or_else(|| body.to_string());

        let fwuid = capture(&FWUID_RE, &search_body, 1).ok_or(ScanError::MissingToken("fwuid"))?;
        let (markup_key, markup_value) = MARKUP_RE
            .captures(&search_body)
            .and_then(|c| Some((c.get(1)?.as_str().to_string(), c.get(2)?.as_str().to_string())))
            .ok_or(ScanError::MissingToken("APPLICATION@markup"))?;
        let app = capture(&APP_RE, &search_body, 1).ok_or(ScanError::MissingToken("app"))?;

        Ok(ContextTokens {
            fwuid,
            markup_key,
            markup_value,
            app,
        })
    }
}

fn capture(re: &Regex, haystack: &str, group: usize) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(group))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

/// Target of a `window.location.href = '...'` assignment, if any.
pub fn find_redirect(body: &str) -> Option<String> {
    if !body.contains("window.location.href") {
        return None;
    }
    capture(&REDIRECT_RE, body, 1)
}

/// Percent-decoded contents of the first `/s/sfsites/l/<..fwuid..>` segment.
pub fn decode_embedded_blob(body: &str) -> Option<String> {
    let encoded = capture(&ENCODED_BLOB_RE, body, 1)?;
    let decoded = urlencoding::decode_binary(encoded.as_bytes());
    Some(String::from_utf8_lossy(&decoded).into_owned())
}

/// Fetch the landing page, follow a script redirect once and assemble the
/// Aura context. Missing any token fails the whole bootstrap.
pub async fn bootstrap(
    client: &Client,
    target: &Target,
    extractor: &dyn ContextExtractor,
) -> Result<AuraContext> {
    info!("Retrieving Aura context from {}", target);

    let mut body = fetch_page(client, target.url()).await?;

    if let Some(redirect) = find_redirect(&body) {
        let redirect_url = target.join(&redirect)?;
        debug!("Following script redirect to {}", redirect_url);
        body = fetch_page(client, &redirect_url).await?;
    }

    match extractor.extract(&body) {
        Ok(tokens) => {
            let context = AuraContext::from_tokens(tokens);
            info!("Retrieved Aura context (fwuid {}, app {})", context.fwuid, context.app);
            Ok(context)
        }
        Err(e) => {
            error!("Could not extract Aura context components (fwuid, markup, app): {}", e);
            Err(e)
        }
    }
}

async fn fetch_page(client: &Client, url: &Url) -> Result<String> {
    let response = client.get(url.clone()).timeout(BOOTSTRAP_TIMEOUT).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScanError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INLINE_PAGE: &str = r#"<script>var auraConfig = {"context":{"mode":"PROD","fwuid":"REdtNUF5ejJUNWxpdVllUjQtUzV4UTFLcUUxeUY3ZVB6dE9hR0VheDVpb2cxMy4zMzU1NDQzMi41MDMzMTY0OA","app":"siteforce:communityApp","loaded":{"APPLICATION@markup://siteforce:communityApp":"1184_ABCdef"}}};</script>"#;

    #[test]
    fn test_extracts_inline_tokens() {
        let tokens = PatternExtractor.extract(INLINE_PAGE).unwrap();
        assert!(tokens.fwuid.starts_with("REdtNUF5"));
        assert_eq!(tokens.app, "siteforce:communityApp");
        assert_eq!(tokens.markup_key, "APPLICATION@markup://siteforce:communityApp");
        assert_eq!(tokens.markup_value, "1184_ABCdef");
    }

    #[test]
    fn test_extracts_percent_encoded_blob() {
        let page = r#"<script src="/s/sfsites/l/%7B%22mode%22%3A%22PROD%22%2C%22app%22%3A%22siteforce%3AcommunityApp%22%2C%22fwuid%22%3A%22abc123%22%2C%22loaded%22%3A%7B%22APPLICATION%40markup%3A%2F%2Fsiteforce%3AcommunityApp%22%3A%22xyz%22%7D%7D/app.js"></script>"#;

        let blob = decode_embedded_blob(page).unwrap();
        assert!(blob.contains(r#""fwuid":"abc123""#));

        let tokens = PatternExtractor.extract(page).unwrap();
        assert_eq!(tokens.fwuid, "abc123");
        assert_eq!(tokens.app, "siteforce:communityApp");
        assert_eq!(tokens.markup_key, "APPLICATION@markup://siteforce:communityApp");
        assert_eq!(tokens.markup_value, "xyz");
    }

    #[test]
    fn test_each_missing_token_fails() {
        let without_fwuid = INLINE_PAGE.replace("\"fwuid\"", "\"fw\"");
        let without_markup = INLINE_PAGE.replace("APPLICATION@markup", "COMPONENT@markup");
        let without_app = INLINE_PAGE.replace("\"app\"", "\"application\"");

        assert!(matches!(
            PatternExtractor.extract(&without_fwuid),
            Err(ScanError::MissingToken("fwuid"))
        ));
        assert!(matches!(
            PatternExtractor.extract(&without_markup),
            Err(ScanError::MissingToken("APPLICATION@markup"))
        ));
        assert!(matches!(
            PatternExtractor.extract(&without_app),
            Err(ScanError::MissingToken("app"))
        ));
    }

    #[test]
    fn test_context_round_trips() {
        let context = AuraContext::from_tokens(PatternExtractor.extract(INLINE_PAGE).unwrap());
        let decoded: AuraContext = serde_json::from_str(&context.to_json()).unwrap();

        assert_eq!(decoded.fwuid, context.fwuid);
        assert_eq!(decoded.app, "siteforce:communityApp");
        assert_eq!(decoded.loaded.len(), 1);
        assert_eq!(
            decoded.loaded.get("APPLICATION@markup://siteforce:communityApp"),
            Some(&"1184_ABCdef".to_string())
        );
        assert_eq!(decoded.mode, "PROD");
        assert!(!decoded.uad);
    }

    #[test]
    fn test_context_json_shape() {
        let context = AuraContext::from_tokens(PatternExtractor.extract(INLINE_PAGE).unwrap());
        let value: Value = serde_json::from_str(&context.to_json()).unwrap();

        assert_eq!(value["dn"], serde_json::json!([]));
        assert_eq!(value["globals"], serde_json::json!({}));
        assert_eq!(value["uad"], Value::Bool(false));
    }

    #[test]
    fn test_find_redirect() {
        let body = "<script>window.location.href = '/s/login/?startURL=%2F';</script>";
        assert_eq!(find_redirect(body), Some("/s/login/?startURL=%2F".to_string()));
        assert_eq!(find_redirect("<html></html>"), None);
    }
}
