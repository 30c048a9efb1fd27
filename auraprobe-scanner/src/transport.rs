use crate::error::{Result, ScanError};
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_2_1) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.150 Safari/537.36";

pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);
pub const BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(10);
pub const EXPLOIT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Settings for the single HTTP client shared by every request of a run.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub user_agent: String,
    pub proxy: Option<String>,
    pub accept_invalid_certs: bool,
    pub download_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            accept_invalid_certs: true,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }
}

impl TransportConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Certificate checks are relaxed on this client only, never process-wide.
    pub fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .user_agent(&self.user_agent)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .connect_timeout(Duration::from_secs(10))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = self.proxy {
            debug!("Routing traffic through proxy {}", proxy);
            let proxy = Proxy::all(proxy)
                .map_err(|e| ScanError::InvalidUrl(format!("proxy {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }
}
