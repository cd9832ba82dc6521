//! Directory-wide uploads.
//!
//! Files are processed one at a time in name order. A failing file is logged
//! and recorded in the [`BatchReport`]; the remaining files are still sent.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::client::I14yClient;
use crate::error::{I14yError, I14yResult};
use crate::registry::CodelistRegistry;

/// Outcome of a directory upload
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, path: &Path, result: I14yResult<()>) {
        self.processed += 1;
        match result {
            Ok(()) => self.succeeded += 1,
            Err(err) => {
                error!("{}: {}", path.display(), err);
                if let Some(hint) = err.hint() {
                    warn!("Hint: {}", hint);
                }
                self.failed.push((path.to_path_buf(), err.to_string()));
            }
        }
    }
}

/// Post every `*.json` concept file in `dir`.
pub async fn post_concepts_in(client: &I14yClient, dir: &Path) -> I14yResult<BatchReport> {
    let files = list_files(dir, |name| name.ends_with(".json"))?;
    info!("Found {} files to process", files.len());

    let mut report = BatchReport::default();
    for file in files {
        info!("Posting file: {}", file.display());
        let result = client.post_concept_file(&file).await.map(|_| ());
        report.record(&file, result);
    }
    Ok(report)
}

/// Replace the codelist entries of every `*_transformed.json` file in `dir`
/// whose concept id can be resolved through `registry`.
pub async fn update_codelists_in(
    client: &I14yClient,
    dir: &Path,
    registry: &CodelistRegistry,
) -> I14yResult<BatchReport> {
    let files = list_files(dir, |name| name.ends_with("_transformed.json"))?;
    info!("Found {} files to process", files.len());

    let mut report = BatchReport::default();
    for file in files {
        let Some(concept_id) = registry.resolve(&file) else {
            warn!("No matching codelist id found for {}", file.display());
            report.skipped.push(file);
            continue;
        };

        info!("Posting {} with codelist id {}", file.display(), concept_id);
        let result = client
            .update_codelist_entries(&file, &concept_id)
            .await
            .map(|_| ());
        report.record(&file, result);
    }
    Ok(report)
}

fn list_files(dir: &Path, keep: impl Fn(&str) -> bool) -> I14yResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(I14yError::NotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let keep_it = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(&keep);
        if keep_it {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
