//! # I14Y registry client
//!
//! Talks to the I14Y interoperability registry on behalf of the terminology
//! tooling: OAuth2 client-credentials authentication, concept and codelist
//! CRUD calls, directory-wide uploads and the mapping from transformed
//! codelist files to registry concept ids.
//!
//! ## Example
//!
//! ```no_run
//! use atrius_i14y_client::{ApiConfig, I14yClient};
//!
//! # async fn demo() -> atrius_i14y_client::I14yResult<()> {
//! let config = ApiConfig::new(
//!     "client-id",
//!     "client-secret",
//!     "https://identity.example.org/token",
//!     "https://api.example.org/api/partner/v1",
//! );
//! let client = I14yClient::new(config)?;
//! let entries = client.get_codelist_entries("08dd632d-b378-e759-84d8-f04d0168890c").await?;
//! println!("{}", entries);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod batch;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod error_log;
pub mod logging;
pub mod output;
pub mod registry;

pub use batch::{BatchReport, post_concepts_in, update_codelists_in};
pub use client::{ConceptQuery, ConceptSummary, I14yClient, save_response_to_file};
pub use config::{ApiArgs, ApiConfig, ApiMode};
pub use error::{I14yError, I14yResult};
pub use error_log::ErrorLog;
pub use output::to_json_pretty;
pub use registry::CodelistRegistry;
