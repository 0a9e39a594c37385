//! Writing a finished run to disk.
//!
//! Layout of the output directory:
//!
//! ```text
//! out/
//!   manifest.json
//!   page-0001-text.mp3
//!   page-0001-summary.mp3
//!   page-0001-interpretation.mp3
//!   ...
//! ```
//!
//! Page numbers in file names are 1-based. Artifacts without audio (the text
//! of a blank page) get no file and a `null` entry in the manifest.

use crate::error::{PagecastError, Result};
use crate::pipeline::{Artifact, PageRecord, PageStore};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub page_count: usize,
    pub pages: Vec<ManifestPage>,
    pub failures: Vec<ManifestFailure>,
}

#[derive(Debug, Serialize)]
pub struct ManifestPage {
    /// 0-based page index
    pub page: usize,
    pub text: String,
    pub summary: String,
    pub interpretation: String,
    /// Audio file per artifact, relative to the manifest
    pub audio: BTreeMap<Artifact, Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct ManifestFailure {
    pub page: usize,
    pub reason: String,
}

/// File name for one artifact of one page.
pub fn audio_file_name(page_index: usize, artifact: Artifact, format: &str) -> String {
    format!("page-{:04}-{}.{}", page_index + 1, artifact, format)
}

/// Write every published page and the manifest into `dir`.
///
/// Creates `dir` if needed. Existing files with the same names are
/// overwritten. Returns the manifest path.
pub fn export_store(
    store: &PageStore,
    page_count: usize,
    dir: &Path,
    format: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let mut pages = Vec::new();
    for page in store.published() {
        let Some(record) = store.get(page) else {
            continue;
        };
        pages.push(write_page(&record, dir, format)?);
    }

    let failures = store
        .failures()
        .into_iter()
        .map(|(page, reason)| ManifestFailure { page, reason })
        .collect();

    let manifest = Manifest {
        page_count,
        pages,
        failures,
    };
    let json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| PagecastError::Other(format!("manifest: {e}")))?;

    let path = dir.join(MANIFEST_FILE);
    fs::write(&path, json)?;
    debug!(path = %path.display(), pages = manifest.pages.len(), "manifest written");
    Ok(path)
}

fn write_page(record: &PageRecord, dir: &Path, format: &str) -> Result<ManifestPage> {
    let mut audio = BTreeMap::new();
    for artifact in Artifact::ALL {
        let bytes = record.audio_of(artifact);
        let file = if bytes.is_empty() {
            None
        } else {
            let name = audio_file_name(record.page_index, artifact, format);
            fs::write(dir.join(&name), bytes)?;
            Some(name)
        };
        audio.insert(artifact, file);
    }

    Ok(ManifestPage {
        page: record.page_index,
        text: record.text.clone(),
        summary: record.summary.clone(),
        interpretation: record.interpretation.clone(),
        audio,
    })
}
