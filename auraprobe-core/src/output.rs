// On-disk layout of a dump run

use auraprobe_scanner::Target;
use auraprobe_scanner::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const DOWNLOADS_DIR: &str = "Downloaded_Files";
pub const SUMMARY_FILE: &str = "_summary.json";

/// Directory holding `<object>.json` files, the summary and downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<parent>/<host[_port][_path]>` for the given target.
    pub fn for_target(parent: &Path, target: &Target) -> Self {
        Self::new(parent.join(target.slug()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join(DOWNLOADS_DIR)
    }

    pub fn object_path(&self, object_name: &str) -> PathBuf {
        let safe: String = object_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.root.join(format!("{}.json", safe))
    }

    pub fn has_object(&self, object_name: &str) -> bool {
        self.object_path(object_name).exists()
    }

    pub fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn save_records(&self, object_name: &str, records: &[Value]) -> Result<PathBuf> {
        let path = self.object_path(object_name);
        write_pretty(&path, records)?;
        Ok(path)
    }

    pub fn save_summary<T: Serialize>(&self, summary: &T) -> Result<PathBuf> {
        let path = self.root.join(SUMMARY_FILE);
        write_pretty(&path, summary)?;
        Ok(path)
    }
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
