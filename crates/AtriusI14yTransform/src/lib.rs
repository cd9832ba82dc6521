//! # ART-DECOR → I14Y value set transformation
//!
//! Converts ART-DECOR value set exports (XML, and semicolon-separated CSV)
//! into the two JSON documents the I14Y registry accepts for a codelist
//! concept: the concept itself and its codelist entries.
//!
//! ```no_run
//! use atrius_i14y_transform::config::TransformDefaults;
//! use atrius_i14y_transform::lookup::OfflineLookup;
//! use atrius_i14y_transform::pipeline::transform_directory;
//! use atrius_i14y_transform::transform::{TransformOptions, parse_valid_from, parse_version};
//! use std::path::Path;
//!
//! # async fn demo() -> atrius_i14y_transform::TransformResult<()> {
//! let opts = TransformOptions::new(
//!     "responsible@example.org",
//!     "deputy@example.org",
//!     parse_valid_from("2025-03-01")?,
//!     parse_version("2.0.1")?,
//!     TransformDefaults::default(),
//! );
//! let report = transform_directory(Path::new("exports"), Path::new("out"), &opts, &OfflineLookup).await?;
//! println!("{} files transformed", report.transformed.len());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod csv_reader;
pub mod error;
pub mod filename;
pub mod lookup;
pub mod model;
pub mod pipeline;
pub mod transform;
pub mod xml_reader;

pub use error::{TransformError, TransformResult};
pub use lookup::{ConceptLookup, OfflineLookup};
pub use model::{CodeEntry, CodeSystemRef, Language, LocalizedText, ValueSet};
pub use pipeline::{TransformReport, TransformedFile, transform_directory};
pub use transform::{TransformOptions, build_codelist_document, build_concept_document};
