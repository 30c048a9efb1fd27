use crate::auditor::{Auditor, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageOutcome, is_file_object};
use crate::output::OutputDir;
use crate::report::{DumpSummary, FailedObject, ObjectSummary};
use auraprobe_scanner::error::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Default cap on pages fetched per object.
pub const DEFAULT_MAX_PAGES: u32 = 1000;

/// Options for dumping objects
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Page through every record instead of stopping after the first page
    pub full_dump: bool,
    /// Skip objects whose `<object>.json` already exists
    pub skip_existing: bool,
    /// Stop an object after this many pages; `0` disables the cap
    pub max_pages: u32,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            full_dump: false,
            skip_existing: false,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl DumpOptions {
    pub fn page_size(&self) -> u32 {
        if self.full_dump {
            MAX_PAGE_SIZE
        } else {
            DEFAULT_PAGE_SIZE
        }
    }
}

/// Callback for reporting which object is being dumped: (index, total, name)
pub type DumpProgressCallback = Arc<dyn Fn(usize, usize, String) + Send + Sync>;

/// State of one object's paged dump.
#[derive(Debug, Clone, Default)]
pub struct DumpSession {
    pub object_name: String,
    pub page: u32,
    pub pages_fetched: u32,
    pub records: Vec<Value>,
    pub files: Vec<PathBuf>,
    pub truncated: bool,
    /// Why the last page requested was refused, if it was
    pub error: Option<String>,
}

impl DumpSession {
    fn new(object_name: &str) -> Self {
        Self {
            object_name: object_name.to_string(),
            page: 1,
            ..Self::default()
        }
    }
}

/// Walk the pages of one object until an empty or refused page, a short
/// page, the first page when not doing a full dump, or the page cap.
///
/// Records of `ContentDocument`/`Document` pages are also downloaded into
/// `files_dir` when one is given.
pub async fn dump_object(
    auditor: &Auditor,
    object_name: &str,
    options: &DumpOptions,
    files_dir: Option<&Path>,
) -> DumpSession {
    let page_size = options.page_size();
    let mut session = DumpSession::new(object_name);

    loop {
        if options.max_pages > 0 && session.pages_fetched >= options.max_pages {
            warn!(
                "Stopping '{}' after {} pages; the server keeps returning full pages",
                object_name, session.pages_fetched
            );
            session.truncated = true;
            break;
        }

        let page = match auditor
            .dump_object_page(object_name, page_size, session.page)
            .await
        {
            PageOutcome::Records(page) => page,
            PageOutcome::Empty => break,
            PageOutcome::Failed(reason) => {
                session.error = Some(reason);
                break;
            }
        };
        session.pages_fetched += 1;

        let returned = page.result.len();
        if let Some(dir) = files_dir
            && is_file_object(object_name)
        {
            let report = auditor.download_files(&page.result, dir).await;
            session.files.extend(report.saved);
        }
        session.records.extend(page.result);

        if !options.full_dump || returned < page_size as usize {
            break;
        }
        session.page += 1;
    }

    session
}

/// Dump every listed object into `output`, one JSON file per object with
/// records, and write `_summary.json` at the end.
pub async fn dump_all(
    auditor: &Auditor,
    output: &OutputDir,
    options: &DumpOptions,
    progress: Option<DumpProgressCallback>,
) -> Result<DumpSummary> {
    let mut summary = DumpSummary::new(
        auditor.target().to_string(),
        auditor.endpoint().map(|u| u.to_string()),
    );

    let objects = auditor.pull_object_list().await;
    summary.objects_total = objects.len();
    if objects.is_empty() {
        summary.finish();
        return Ok(summary);
    }

    output.create()?;
    let downloads_dir = output.downloads_dir();

    for (idx, object_name) in objects.iter().enumerate() {
        if let Some(ref callback) = progress {
            callback(idx, objects.len(), object_name.clone());
        }

        if options.skip_existing && output.has_object(object_name) {
            info!("Skipping '{}', file already exists", object_name);
            summary.skipped.push(object_name.clone());
            continue;
        }

        let session = dump_object(auditor, object_name, options, Some(&downloads_dir)).await;
        summary.files_downloaded.extend(session.files.iter().cloned());

        if session.records.is_empty() {
            match session.error {
                Some(reason) => summary.failed.push(FailedObject {
                    name: object_name.clone(),
                    reason,
                }),
                None => summary.empty.push(object_name.clone()),
            }
            continue;
        }
        if let Some(ref reason) = session.error {
            warn!(
                "Saving {} records of '{}' although page {} failed: {}",
                session.records.len(),
                object_name,
                session.page,
                reason
            );
        }

        match output.save_records(object_name, &session.records) {
            Ok(file) => {
                info!(
                    "Saved {} records to {}",
                    session.records.len(),
                    file.display()
                );
                summary.dumped.push(ObjectSummary {
                    name: object_name.clone(),
                    records: session.records.len(),
                    pages: session.pages_fetched,
                    truncated: session.truncated,
                    file,
                });
            }
            Err(e) => {
                error!("Failed to save data for '{}': {}", object_name, e);
                summary.failed.push(FailedObject {
                    name: object_name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    summary.finish();
    let summary_path = output.save_summary(&summary)?;
    info!(
        "Dumping finished. Dumped {} objects; summary at {}",
        summary.dumped.len(),
        summary_path.display()
    );

    Ok(summary)
}

/// First page of each named object, default page size, no paging.
pub async fn pull_objects(
    auditor: &Auditor,
    object_names: &[String],
    files_dir: Option<&Path>,
) -> Vec<(String, Vec<Value>)> {
    let options = DumpOptions::default();
    let mut pulled = Vec::new();

    for object_name in object_names {
        let session = dump_object(auditor, object_name, &options, files_dir).await;
        if !session.records.is_empty() {
            pulled.push((object_name.clone(), session.records));
        }
    }

    pulled
}
