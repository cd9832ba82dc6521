//! Directory transformation.
//!
//! Every `.xml` / `.csv` export in the input directory produces two files with
//! the same name: the concept document under `<output>/Concepts` and the
//! codelist-entries document under `<output>/Codelists`.

use atrius_i14y_client::to_json_pretty;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::csv_reader::read_value_set_csv;
use crate::error::{TransformError, TransformResult};
use crate::filename::{concept_name_from_filename, transformed_file_name};
use crate::lookup::{ConceptLookup, resolve_concept_id};
use crate::model::ValueSet;
use crate::transform::{TransformOptions, build_codelist_document, build_concept_document};
use crate::xml_reader::read_value_set_xml;

pub const CONCEPTS_DIR: &str = "Concepts";
pub const CODELISTS_DIR: &str = "Codelists";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Xml,
    Csv,
}

impl SourceFormat {
    /// Format of an export file, judged by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "xml" => Some(SourceFormat::Xml),
            "csv" => Some(SourceFormat::Csv),
            _ => None,
        }
    }
}

/// One successfully transformed export
#[derive(Debug, Clone)]
pub struct TransformedFile {
    pub source: PathBuf,
    pub concept_name: String,
    pub concept_id: Option<String>,
    pub concept_path: PathBuf,
    pub codelist_path: PathBuf,
}

#[derive(Debug, Default)]
pub struct TransformReport {
    pub transformed: Vec<TransformedFile>,
    pub failed: Vec<(PathBuf, String)>,
}

impl TransformReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub fn read_value_set(path: &Path) -> TransformResult<ValueSet> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Xml) => read_value_set_xml(path),
        Some(SourceFormat::Csv) => read_value_set_csv(path),
        None => Err(TransformError::UnsupportedFile(path.to_path_buf())),
    }
}

/// Transform every export in `input` into `output`.
pub async fn transform_directory(
    input: &Path,
    output: &Path,
    opts: &TransformOptions,
    lookup: &dyn ConceptLookup,
) -> TransformResult<TransformReport> {
    if !input.is_dir() {
        return Err(TransformError::InvalidInput(format!(
            "input directory {} does not exist",
            input.display()
        )));
    }

    let concepts_dir = output.join(CONCEPTS_DIR);
    let codelists_dir = output.join(CODELISTS_DIR);
    fs::create_dir_all(&concepts_dir)?;
    fs::create_dir_all(&codelists_dir)?;

    let mut sources = Vec::new();
    for entry in fs::read_dir(input)? {
        let path = entry?.path();
        if path.is_file() && SourceFormat::from_path(&path).is_some() {
            sources.push(path);
        }
    }
    sources.sort();
    info!("Starting transformation of {} files", sources.len());

    let mut report = TransformReport::default();
    for source in sources {
        match transform_file(&source, &concepts_dir, &codelists_dir, opts, lookup).await {
            Ok(done) => {
                info!(
                    "Transformed {} -> {}",
                    source.display(),
                    done.concept_path
                        .file_name()
                        .map(|n| n.to_string_lossy())
                        .unwrap_or_default()
                );
                report.transformed.push(done);
            }
            Err(err) => {
                error!("Failed to transform {}: {}", source.display(), err);
                report.failed.push((source, err.to_string()));
            }
        }
    }

    info!(
        "All transformations complete: {} written, {} failed. Output files written to {}",
        report.transformed.len(),
        report.failed.len(),
        output.display()
    );
    Ok(report)
}

/// Transform a single export into the two output directories.
pub async fn transform_file(
    source: &Path,
    concepts_dir: &Path,
    codelists_dir: &Path,
    opts: &TransformOptions,
    lookup: &dyn ConceptLookup,
) -> TransformResult<TransformedFile> {
    let value_set = read_value_set(source)?;

    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let concept_name = concept_name_from_filename(&file_name);
    if concept_name.is_empty() {
        return Err(TransformError::InvalidInput(format!(
            "no concept name can be derived from '{}'",
            file_name
        )));
    }

    let concept_id = if opts.force_new {
        None
    } else {
        resolve_concept_id(lookup, &value_set.identifier).await
    };

    let output_name = transformed_file_name(&concept_name, concept_id.as_deref());
    let concept_path = concepts_dir.join(&output_name);
    let codelist_path = codelists_dir.join(&output_name);

    write_json(&build_concept_document(&value_set, opts), &concept_path)?;
    write_json(&build_codelist_document(&value_set, opts), &codelist_path)?;

    Ok(TransformedFile {
        source: source.to_path_buf(),
        concept_name,
        concept_id,
        concept_path,
        codelist_path,
    })
}

/// Write `value` as JSON indented by four spaces, non-ASCII characters unescaped.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> TransformResult<()> {
    fs::write(path, to_json_pretty(value)?)?;
    Ok(())
}
