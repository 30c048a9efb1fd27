use crate::error::{Result, ScanError};
use std::fmt;
use url::Url;

/// Base URL of the audited site, always with a scheme and a trailing `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    base: Url,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = normalize_url(raw.trim());
        let base = Url::parse(&normalized)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", normalized, e)))?;

        if base.host_str().is_none() {
            return Err(ScanError::InvalidUrl(format!("{} has no host", normalized)));
        }

        Ok(Self { base })
    }

    pub fn url(&self) -> &Url {
        &self.base
    }

    pub fn as_str(&self) -> &str {
        self.base.as_str()
    }

    /// Resolve a relative path (or absolute URL) against the base.
    pub fn join(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| ScanError::InvalidUrl(format!("{} + {}: {}", self.base, path, e)))
    }

    /// `host[_port][_path_segments]`, usable as a directory name.
    pub fn slug(&self) -> String {
        let mut slug = self.base.host_str().unwrap_or("unknown").to_string();
        if let Some(port) = self.base.port() {
            slug.push('_');
            slug.push_str(&port.to_string());
        }

        let path = self.base.path().trim_matches('/');
        if !path.is_empty() {
            slug.push('_');
            slug.push_str(&path.replace('/', "_"));
        }

        slug
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)
    }
}

/// Prepend `https://` when no scheme is given and append a trailing `/`.
pub fn normalize_url(url: &str) -> String {
    let mut normalized = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    normalized
}
