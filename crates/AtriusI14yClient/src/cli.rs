//! # I14Y registry CLI
//!
//! Command-line access to the registry operations of [`I14yClient`].
//!
//! ```text
//! atrius-i14y [OPTIONS] <COMMAND>
//!
//! Commands (short alias in brackets):
//!   post-concept     [pc]    <FILE>                 create a concept
//!   post-concepts    [pmc]   <DIR>                  create every concept in DIR
//!   post-codelist    [pcl]   <FILE> <CONCEPT_ID>    import codelist entries
//!   post-codelists   [pmcl]  <DIR> [--registry F]   replace entries of every *_transformed.json
//!   update-codelist  [ucl]   <FILE> <CONCEPT_ID>    delete, then import codelist entries
//!   delete-codelist  [dcl]   <CONCEPT_ID>
//!   get-codelist     [gce]   <CONCEPT_ID> [-o F]
//!   get-concept      [gci]   <CONCEPT_ID> [-o F]
//!   delete-concept   [dc]    <CONCEPT_ID>
//!   get-concepts     [gc]    [--identifier] [--publisher] [--status] [-o F]
//!   get-epd-concepts [gepd]  [--publisher] [--status] [-o F]
//! ```
//!
//! Connection settings come from flags or the environment, see
//! [`crate::config`].
//!
//! ## Usage Examples
//!
//! ```bash
//! API_MODE=abn atrius-i14y ucl out/Codelists/EprRole_transformed.json 08dd632d-b378-e759-84d8-f04d0168890c
//! atrius-i14y gepd --status Recorded -o epd_concepts.json
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::batch::{BatchReport, post_concepts_in, update_codelists_in};
use crate::client::{ConceptQuery, I14yClient, save_response_to_file};
use crate::config::ApiArgs;
use crate::error::I14yError;
use crate::error_log::ErrorLog;
use crate::logging::init_tracing;
use crate::registry::CodelistRegistry;

#[derive(Parser, Debug)]
#[command(name = "atrius-i14y")]
#[command(about = "Manage concepts and codelists on the I14Y registry")]
pub struct Args {
    /// Log level for the tool's own output (overridden by RUST_LOG)
    #[arg(long, env = "I14Y_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(flatten)]
    pub api: ApiArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a concept from a transformed concept file
    #[command(visible_alias = "pc")]
    PostConcept { file: PathBuf },

    /// Create a concept for every JSON file in a directory
    #[command(visible_alias = "pmc")]
    PostConcepts { dir: PathBuf },

    /// Import codelist entries into an existing concept
    #[command(visible_alias = "pcl")]
    PostCodelist { file: PathBuf, concept_id: String },

    /// Replace the codelist entries of every mapped *_transformed.json file in a directory
    #[command(visible_alias = "pmcl")]
    PostCodelists {
        dir: PathBuf,

        /// JSON object of additional `{"<file stem>": "<concept id>"}` mappings
        #[arg(long, env = "I14Y_CODELIST_REGISTRY")]
        registry: Option<PathBuf>,
    },

    /// Delete the codelist entries of a concept, then import new ones
    #[command(visible_alias = "ucl")]
    UpdateCodelist { file: PathBuf, concept_id: String },

    /// Delete all codelist entries of a concept
    #[command(visible_alias = "dcl")]
    DeleteCodelist { concept_id: String },

    /// Fetch the codelist entries of a concept
    #[command(visible_alias = "gce")]
    GetCodelist {
        concept_id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch a concept by id
    #[command(visible_alias = "gci")]
    GetConcept {
        concept_id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a concept by id
    #[command(visible_alias = "dc")]
    DeleteConcept { concept_id: String },

    /// List concepts
    #[command(visible_alias = "gc")]
    GetConcepts {
        /// Concept identifier (value set OID)
        #[arg(long)]
        identifier: Option<String>,
        #[arg(long)]
        publisher: Option<String>,
        /// Registration status, e.g. Recorded
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the concepts of the EPD publisher
    #[command(visible_alias = "gepd")]
    GetEpdConcepts {
        #[arg(long, env = "PUBLISHER_IDENTIFIER", default_value = "CH_eHealth")]
        publisher: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Main CLI execution function
pub async fn run_cli(args: Args) -> Result<()> {
    init_tracing(&args.log_level);

    let config = args.api.resolve()?;
    let client = I14yClient::new(config)?.with_error_log(ErrorLog::new(&args.api.error_log));
    info!("Using {:?} registry at {}", args.api.api_mode, client.base_url());

    let result = dispatch(&client, args.command).await;
    if let Err(err) = &result {
        if let Some(hint) = err.downcast_ref::<I14yError>().and_then(I14yError::hint) {
            warn!("Hint: {}", hint);
        }
        if err
            .downcast_ref::<I14yError>()
            .and_then(I14yError::status)
            .is_some()
        {
            info!(
                "Technical details were appended to {}",
                args.api.error_log.display()
            );
        }
    }
    result
}

async fn dispatch(client: &I14yClient, command: Command) -> Result<()> {
    match command {
        Command::PostConcept { file } => {
            let response = client.post_concept_file(&file).await?;
            emit(&response, None)
        }
        Command::PostConcepts { dir } => {
            let report = post_concepts_in(client, &dir).await?;
            finish_batch(&report)
        }
        Command::PostCodelist { file, concept_id } => {
            let response = client.post_codelist_entries(&file, &concept_id).await?;
            emit(&response, None)
        }
        Command::PostCodelists { dir, registry } => {
            let mut codelists = CodelistRegistry::builtin();
            if let Some(path) = registry {
                let merged = codelists
                    .load_overrides(&path)
                    .with_context(|| format!("loading codelist registry {}", path.display()))?;
                info!("Loaded {} codelist mappings from {}", merged, path.display());
            }
            let report = update_codelists_in(client, &dir, &codelists).await?;
            finish_batch(&report)
        }
        Command::UpdateCodelist { file, concept_id } => {
            let response = client.update_codelist_entries(&file, &concept_id).await?;
            emit(&response, None)
        }
        Command::DeleteCodelist { concept_id } => {
            let response = client.delete_codelist_entries(&concept_id).await?;
            emit(&response, None)
        }
        Command::GetCodelist { concept_id, output } => {
            let response = client.get_codelist_entries(&concept_id).await?;
            emit(&response, output.as_deref())
        }
        Command::GetConcept { concept_id, output } => {
            let response = client.get_concept(&concept_id).await?;
            emit(&response, output.as_deref())
        }
        Command::DeleteConcept { concept_id } => {
            let response = client.delete_concept(&concept_id).await?;
            emit(&response, None)
        }
        Command::GetConcepts {
            identifier,
            publisher,
            status,
            output,
        } => {
            let query = ConceptQuery {
                identifier,
                publisher,
                status,
            };
            let response = client.get_concepts(&query).await?;
            emit(&response, output.as_deref())
        }
        Command::GetEpdConcepts {
            publisher,
            status,
            output,
        } => {
            let query = ConceptQuery {
                identifier: None,
                publisher: Some(publisher),
                status,
            };
            let response = client.get_concepts(&query).await?;
            emit(&response, output.as_deref())
        }
    }
}

/// Print a response to stdout, or save it when an output file was requested.
fn emit(response: &Value, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => save_response_to_file(response, path)
            .with_context(|| format!("writing {}", path.display()))?,
        None if response.is_null() => {}
        None => println!("{}", serde_json::to_string_pretty(response)?),
    }
    Ok(())
}

fn finish_batch(report: &BatchReport) -> Result<()> {
    info!(
        "Processed {} files: {} succeeded, {} skipped, {} failed",
        report.processed,
        report.succeeded,
        report.skipped.len(),
        report.failed.len()
    );
    for (path, reason) in &report.failed {
        error!("  {}: {}", path.display(), reason);
    }
    if !report.is_success() {
        bail!("{} of {} files failed", report.failed.len(), report.processed);
    }
    Ok(())
}
