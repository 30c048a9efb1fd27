use auraprobe_scanner::bootstrap::{AuraContext, ContextExtractor, PatternExtractor};
use auraprobe_scanner::download::DownloadReport;
use auraprobe_scanner::error::Result;
use auraprobe_scanner::protocol::{
    ActionResponse, ActionResult, ActionState, RecordPage, build_list_payload,
    build_object_list_payload, build_record_payload,
};
use auraprobe_scanner::{Target, TransportConfig};
use reqwest::Client;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Objects whose records point at downloadable files.
pub const FILE_OBJECTS: [&str; 2] = ["ContentDocument", "Document"];

pub fn is_file_object(object_name: &str) -> bool {
    FILE_OBJECTS.contains(&object_name)
}

/// Result of asking for one page of an object.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Records(RecordPage),
    Empty,
    /// The server refused the page or the request failed.
    Failed(String),
}

/// First server error of an action, or its state when none was sent.
fn describe_error(action: &ActionResult) -> String {
    match action.first_error() {
        Some(err) => err
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string()),
        None => format!("state {:?} without error details", action.state),
    }
}

/// Objects split by naming convention, for reporting only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPartition {
    pub standard: Vec<String>,
    pub custom: Vec<String>,
}

pub fn partition_objects(objects: &[String]) -> ObjectPartition {
    let (custom, standard): (Vec<String>, Vec<String>) = objects
        .iter()
        .cloned()
        .partition(|name| name.ends_with("__c"));
    ObjectPartition { standard, custom }
}

/// One audit run against one site: owns the client, the endpoint once found
/// and the context once bootstrapped.
pub struct Auditor {
    target: Target,
    client: Client,
    extractor: Box<dyn ContextExtractor>,
    endpoint: Option<Url>,
    context: Option<AuraContext>,
    download_timeout: Duration,
}

impl Auditor {
    pub fn new(target: Target, transport: &TransportConfig) -> Result<Self> {
        Ok(Self {
            target,
            client: transport.build_client()?,
            extractor: Box::new(PatternExtractor),
            endpoint: None,
            context: None,
            download_timeout: transport.download_timeout,
        })
    }

    pub fn with_extractor(mut self, extractor: Box<dyn ContextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    pub fn context(&self) -> Option<&AuraContext> {
        self.context.as_ref()
    }

    /// Discover the endpoint on first call; later calls reuse it.
    pub async fn find_endpoint(&mut self) -> Option<&Url> {
        if self.endpoint.is_none() {
            self.endpoint = auraprobe_scanner::discover(&self.client, &self.target).await;
        }
        self.endpoint.as_ref()
    }

    pub async fn load_context(&mut self) -> Option<&AuraContext> {
        match auraprobe_scanner::bootstrap(&self.client, &self.target, self.extractor.as_ref()).await
        {
            Ok(context) => self.context = Some(context),
            Err(e) => {
                error!("Failed to get Aura context from {}: {}", self.target, e);
                self.context = None;
            }
        }
        self.context.as_ref()
    }

    pub async fn execute(&self, message: &str) -> Result<ActionResponse> {
        auraprobe_scanner::execute(
            &self.client,
            self.endpoint.as_ref(),
            self.context.as_ref(),
            message,
        )
        .await
    }

    /// Every object name the guest can see. Empty on any failure.
    pub async fn pull_object_list(&self) -> Vec<String> {
        info!("Pulling the list of all available objects");

        let response = match self.execute(&build_object_list_payload()).await {
            Ok(response) if !response.has_exception() => response,
            Ok(_) => {
                error!("Failed to pull object list: server raised an exception event");
                return Vec::new();
            }
            Err(e) => {
                error!("Failed to pull object list: {}", e);
                return Vec::new();
            }
        };

        let Some(object_map) = response
            .action()
            .and_then(|a| a.return_value.as_ref())
            .and_then(|v| v.get("apiNamesToKeyPrefixes"))
            .and_then(Value::as_object)
        else {
            error!("Failed to parse object list: apiNamesToKeyPrefixes missing from response");
            return Vec::new();
        };

        if object_map.is_empty() {
            warn!("No objects found in the response");
            return Vec::new();
        }

        let objects: Vec<String> = object_map.keys().cloned().collect();
        let partition = partition_objects(&objects);
        info!("Found {} total objects", objects.len());
        info!("Standard objects: {:?}", partition.standard);
        info!("Custom objects: {:?}", partition.custom);

        objects
    }

    /// A single record by id, as returned by `getRecord`.
    pub async fn dump_record(&self, record_id: &str) -> Option<Value> {
        info!("Dumping record with id {}", record_id);

        let response = match self.execute(&build_record_payload(record_id)).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to dump record {}: {}", record_id, e);
                return None;
            }
        };

        match response.action() {
            Some(action) if action.is_success() => {
                info!("Dumped record {}", record_id);
                Some(action.return_value.clone().unwrap_or(Value::Null))
            }
            Some(action) => {
                let reason = describe_error(action);
                error!(
                    "Failed to dump record {}: state {:?}, error {}",
                    record_id, action.state, reason
                );
                None
            }
            None => {
                error!("Failed to dump record {}: no action in response", record_id);
                None
            }
        }
    }

    /// One page of records, telling a refused page apart from an empty one.
    pub async fn dump_object_page(
        &self,
        object_name: &str,
        page_size: u32,
        page: u32,
    ) -> PageOutcome {
        info!("Dumping '{}' (page {}, size {})", object_name, page, page_size);

        let response = match self
            .execute(&build_list_payload(object_name, page_size, page))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to get data for '{}': {}", object_name, e);
                return PageOutcome::Failed(e.to_string());
            }
        };

        let Some(action) = response.action() else {
            error!("Failed to parse response for '{}': no action", object_name);
            return PageOutcome::Failed("no action in response".to_string());
        };

        if action.state == ActionState::Error {
            let reason = describe_error(action);
            error!("Error for object '{}': {}", object_name, reason);
            return PageOutcome::Failed(reason);
        }

        let Some(return_value) = action.return_value.as_ref() else {
            warn!("No records found for '{}'", object_name);
            return PageOutcome::Empty;
        };

        match RecordPage::from_return_value(return_value) {
            Some(page) if !page.result.is_empty() => {
                info!(
                    "Found {} records for '{}' (total: {})",
                    page.result.len(),
                    object_name,
                    page.total_count
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                );
                PageOutcome::Records(page)
            }
            Some(_) => {
                warn!("No records found for '{}'", object_name);
                PageOutcome::Empty
            }
            None => {
                error!("Unexpected page shape for '{}'", object_name);
                PageOutcome::Failed("unexpected returnValue shape".to_string())
            }
        }
    }

    pub async fn download_files(&self, records: &[Value], dest_dir: &Path) -> DownloadReport {
        match auraprobe_scanner::download_files(
            &self.client,
            &self.target,
            records,
            dest_dir,
            self.download_timeout,
        )
        .await
        {
            Ok(report) => report,
            Err(e) => {
                error!("Failed to prepare download directory {}: {}", dest_dir.display(), e);
                DownloadReport {
                    saved: Vec::new(),
                    skipped: records.len(),
                }
            }
        }
    }
}
