//! # Value set transformation CLI
//!
//! ```text
//! atrius-i14y-transform <RESPONSIBLE> <DEPUTY> <INPUT_DIR> <OUTPUT_DIR> <VALID_FROM> [VERSION]
//!
//!   RESPONSIBLE, DEPUTY   person keys (see --person / DEFAULT_*_SHORT_NAME)
//!   VALID_FROM            YYYY-MM-DD
//!   VERSION               semantic version [default: DEFAULT_VERSION]
//!   -n, --new             treat every value set as a new concept, no registry lookup
//!       --offline         never contact the registry
//!       --person K=E      register a person key
//! ```
//!
//! Without `--new` / `--offline` the registry connection settings of
//! `atrius-i14y` are required (`API_MODE`, `ABN_*` / `PROD_*`).
//!
//! ## Usage Examples
//!
//! ```bash
//! atrius-i14y-transform ABC XYZ ./exports ./out 2025-03-01 2.0.1 \
//!     --person ABC=abc@example.org --person XYZ=xyz@example.org
//! ```

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use atrius_i14y_client::logging::init_tracing;
use atrius_i14y_client::{ApiArgs, ErrorLog, I14yClient};

use crate::config::{PersonArgs, PersonDirectory, TransformDefaults};
use crate::lookup::{ConceptLookup, OfflineLookup};
use crate::pipeline::{TransformReport, transform_directory};
use crate::transform::{TransformOptions, parse_valid_from, parse_version};

#[derive(Parser, Debug)]
#[command(name = "atrius-i14y-transform")]
#[command(about = "Transform ART-DECOR value set exports into I14Y concept and codelist documents")]
pub struct Args {
    /// Person key of the responsible person
    pub responsible: String,

    /// Person key of the deputy
    pub deputy: String,

    /// Directory containing .xml / .csv exports
    pub input: PathBuf,

    /// Directory receiving Concepts/ and Codelists/
    pub output: PathBuf,

    /// Date from which the concepts are valid (YYYY-MM-DD)
    #[arg(value_parser = parse_date)]
    pub valid_from: NaiveDate,

    /// Concept version, e.g. 2.0.3
    pub version: Option<String>,

    /// Create new concepts instead of new versions of existing ones
    #[arg(short = 'n', long = "new")]
    pub new: bool,

    /// Skip registry lookups
    #[arg(long)]
    pub offline: bool,

    #[arg(long, env = "I14Y_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(flatten)]
    pub persons: PersonArgs,

    #[command(flatten)]
    pub defaults: TransformDefaults,

    #[command(flatten)]
    pub api: ApiArgs,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_valid_from(s).map_err(|e| e.to_string())
}

/// Main CLI execution function
pub async fn run_cli(args: Args) -> Result<()> {
    init_tracing(&args.log_level);

    let opts = build_options(&args)?;

    let report = if args.offline || opts.force_new {
        transform_directory(&args.input, &args.output, &opts, &OfflineLookup).await?
    } else {
        let config = args
            .api
            .resolve()
            .context("registry settings are needed to look up existing concepts (or pass --offline)")?;
        let client =
            I14yClient::new(config)?.with_error_log(ErrorLog::new(&args.api.error_log));
        transform_directory(&args.input, &args.output, &opts, &client as &dyn ConceptLookup)
            .await?
    };

    summarize(&report)
}

fn build_options(args: &Args) -> Result<TransformOptions> {
    let persons = PersonDirectory::from_args(&args.persons);
    let responsible = persons.email(&args.responsible)?;
    let deputy = persons.email(&args.deputy)?;

    let version_text = args
        .version
        .as_deref()
        .unwrap_or(&args.defaults.default_version);
    let version = parse_version(version_text)?;

    Ok(TransformOptions::new(
        responsible,
        deputy,
        args.valid_from,
        version,
        args.defaults.clone(),
    )
    .with_force_new(args.new))
}

fn summarize(report: &TransformReport) -> Result<()> {
    for (path, reason) in &report.failed {
        error!("  {}: {}", path.display(), reason);
    }
    if !report.is_success() {
        bail!(
            "{} of {} files failed to transform",
            report.failed.len(),
            report.failed.len() + report.transformed.len()
        );
    }
    info!("{} files transformed", report.transformed.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec![
            "atrius-i14y-transform",
            "ABC",
            "XYZ",
            "in",
            "out",
            "2025-03-01",
        ];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(&[
            "--person",
            "ABC=abc@example.org",
            "--person",
            "XYZ=xyz@example.org",
        ]);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn positional_arguments_and_new_flag() {
        let args = parse(&["2.0.3", "-n"]);
        let opts = build_options(&args).unwrap();
        assert!(opts.force_new);
        assert_eq!(opts.version.to_string(), "2.0.3");
        assert_eq!(opts.responsible.email, "abc@example.org");
        assert_eq!(opts.deputy.email, "xyz@example.org");
        assert_eq!(opts.valid_from, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn version_falls_back_to_default() {
        let mut args = parse(&[]);
        args.defaults.default_version = "2.0.0".to_string();
        assert_eq!(build_options(&args).unwrap().version.to_string(), "2.0.0");
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(
            Args::try_parse_from(["t", "ABC", "XYZ", "in", "out", "01.03.2025"]).is_err()
        );

        let args = parse(&["v2"]);
        assert!(build_options(&args).is_err());

        let mut args = parse(&[]);
        args.responsible = "NOPE".to_string();
        let err = build_options(&args).unwrap_err();
        assert!(err.to_string().contains("NOPE"));
    }
}
