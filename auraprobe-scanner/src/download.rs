use crate::error::Result;
use crate::protocol::record_id;
use crate::target::Target;
use reqwest::Client;
use reqwest::header::CONTENT_DISPOSITION;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

const DOWNLOAD_PATH: &str = "sfc/servlet.shepherd/document/download/";

/// Outcome of one batch of document downloads.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    pub skipped: usize,
}

/// Download the file behind each `ContentDocument`/`Document` record into
/// `dest_dir`. Every failure is confined to its own record.
pub async fn download_files(
    client: &Client,
    target: &Target,
    records: &[Value],
    dest_dir: &Path,
    timeout: Duration,
) -> Result<DownloadReport> {
    fs::create_dir_all(dest_dir).await?;

    let mut report = DownloadReport::default();
    for record in records {
        let Some(id) = record_id(record) else {
            error!("Missing key record.Id in record data; skipping");
            report.skipped += 1;
            continue;
        };

        match download_one(client, target, id, dest_dir, timeout).await {
            Ok(Some(path)) => report.saved.push(path),
            Ok(None) => report.skipped += 1,
            Err(e) => {
                error!("Failed to download file for record {}: {}", id, e);
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

async fn download_one(
    client: &Client,
    target: &Target,
    id: &str,
    dest_dir: &Path,
    timeout: Duration,
) -> Result<Option<PathBuf>> {
    let url = target.join(&format!("{}{}", DOWNLOAD_PATH, id))?;
    let mut response = client
        .get(url.clone())
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;

    let Some(disposition) = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    else {
        warn!("No Content-Disposition header for record {}. Skipping.", id);
        return Ok(None);
    };

    let Some(filename) = parse_content_disposition(&disposition) else {
        warn!("Could not get filename for record {}.", id);
        return Ok(None);
    };

    let path = dest_dir.join(&filename);
    info!("Downloading '{}' from {}", filename, url);

    let mut file = File::create(&path).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    info!("Downloaded '{}' to {}", filename, path.display());
    Ok(Some(path))
}

/// Filename from a `Content-Disposition` value, reduced to its last path
/// component. `filename*` (RFC 5987) wins over `filename`.
pub fn parse_content_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in split_params(header).into_iter().skip(1) {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(unquote(value)),
            "filename*" => extended = decode_extended(value),
            _ => {}
        }
    }

    extended
        .or(plain)
        .and_then(|name| sanitize_filename(&name))
}

/// Split on `;` outside of quoted strings.
fn split_params(header: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in header.chars() {
        match c {
            _ if escaped => {
                current.push(c);
                escaped = false;
            }
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ';' if !in_quotes => params.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    params.push(current);
    params
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

/// `charset'lang'percent-encoded`
fn decode_extended(value: &str) -> Option<String> {
    let value = unquote(value);
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _lang = parts.next()?;
    let encoded = parts.next()?;

    let bytes = urlencoding::decode_binary(encoded.as_bytes());
    if charset.eq_ignore_ascii_case("utf-8") {
        String::from_utf8(bytes.into_owned()).ok()
    } else {
        // ISO-8859-1 and friends: map bytes to code points.
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}

fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last.to_string())
}
