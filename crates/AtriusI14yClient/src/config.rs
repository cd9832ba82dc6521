//! Connection settings for the I14Y registry.
//!
//! Two credential sets are supported: the acceptance environment (`ABN_*`)
//! and production (`PROD_*`). `API_MODE` picks one of them. All values can be
//! given as flags or environment variables:
//!
//! ```text
//! API_MODE            prod | abn (default: abn)
//! PROD_CLIENT_ID      PROD_CLIENT_SECRET   PROD_TOKEN_URL   PROD_BASE_API_URL
//! ABN_CLIENT_ID       ABN_CLIENT_SECRET    ABN_TOKEN_URL    ABN_BASE_API_URL
//! I14Y_TIMEOUT_SECS   request timeout in seconds (default: 30)
//! I14Y_ERROR_LOG      file receiving technical dumps of failed requests
//! ```

use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{I14yError, I14yResult};

/// Registry environment selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApiMode {
    /// Production registry
    Prod,
    /// Acceptance (test) registry
    Abn,
}

/// Resolved connection settings for one registry environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    /// Base URL without trailing slash, e.g. `https://api.i14y.admin.ch/api/partner/v1`
    pub base_api_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build a config; `base_api_url` is normalized by trimming any trailing `/`.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
        base_api_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: token_url.into(),
            base_api_url: base_api_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Command-line / environment options for the registry connection
#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// Registry environment to talk to
    #[arg(long, env = "API_MODE", value_enum, ignore_case = true, default_value_t = ApiMode::Abn)]
    pub api_mode: ApiMode,

    #[arg(long, env = "PROD_CLIENT_ID", hide_env_values = true)]
    pub prod_client_id: Option<String>,

    #[arg(long, env = "PROD_CLIENT_SECRET", hide_env_values = true)]
    pub prod_client_secret: Option<String>,

    #[arg(long, env = "PROD_TOKEN_URL")]
    pub prod_token_url: Option<String>,

    #[arg(long, env = "PROD_BASE_API_URL")]
    pub prod_base_api_url: Option<String>,

    #[arg(long, env = "ABN_CLIENT_ID", hide_env_values = true)]
    pub abn_client_id: Option<String>,

    #[arg(long, env = "ABN_CLIENT_SECRET", hide_env_values = true)]
    pub abn_client_secret: Option<String>,

    #[arg(long, env = "ABN_TOKEN_URL")]
    pub abn_token_url: Option<String>,

    #[arg(long, env = "ABN_BASE_API_URL")]
    pub abn_base_api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "I14Y_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// File receiving technical details of failed requests
    #[arg(long, env = "I14Y_ERROR_LOG", default_value = "api_errors_log.txt")]
    pub error_log: PathBuf,
}

impl ApiArgs {
    /// Select the credential set for `api_mode` and check that it is complete.
    pub fn resolve(&self) -> I14yResult<ApiConfig> {
        let (prefix, id, secret, token_url, base) = match self.api_mode {
            ApiMode::Prod => (
                "PROD",
                &self.prod_client_id,
                &self.prod_client_secret,
                &self.prod_token_url,
                &self.prod_base_api_url,
            ),
            ApiMode::Abn => (
                "ABN",
                &self.abn_client_id,
                &self.abn_client_secret,
                &self.abn_token_url,
                &self.abn_base_api_url,
            ),
        };

        let config = ApiConfig::new(
            required(prefix, "CLIENT_ID", id)?,
            required(prefix, "CLIENT_SECRET", secret)?,
            required(prefix, "TOKEN_URL", token_url)?,
            required(prefix, "BASE_API_URL", base)?,
        )
        .with_timeout(Duration::from_secs(self.timeout_secs));

        Ok(config)
    }
}

fn required(prefix: &str, name: &str, value: &Option<String>) -> I14yResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(I14yError::Config(format!("{}_{} is not set", prefix, name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        api: ApiArgs,
    }

    fn parse(args: &[&str]) -> ApiArgs {
        let mut argv = vec!["test"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).unwrap().api
    }

    #[test]
    fn base_url_is_normalized() {
        let config = ApiConfig::new("id", "secret", "https://idp/token", "https://api/v1/");
        assert_eq!(config.base_api_url, "https://api/v1");
    }

    #[test]
    fn prod_mode_selects_prod_credentials() {
        let args = parse(&[
            "--api-mode",
            "PROD",
            "--prod-client-id",
            "p-id",
            "--prod-client-secret",
            "p-secret",
            "--prod-token-url",
            "https://idp/prod",
            "--prod-base-api-url",
            "https://api/prod/",
            "--abn-client-id",
            "a-id",
        ]);
        let config = args.resolve().unwrap();
        assert_eq!(config.client_id, "p-id");
        assert_eq!(config.token_url, "https://idp/prod");
        assert_eq!(config.base_api_url, "https://api/prod");
    }

    #[test]
    fn missing_value_names_the_variable() {
        let args = parse(&[
            "--api-mode",
            "abn",
            "--abn-client-id",
            "a-id",
            "--abn-client-secret",
            "  ",
            "--abn-token-url",
            "https://idp/abn",
            "--abn-base-api-url",
            "https://api/abn",
        ]);
        let err = args.resolve().unwrap_err();
        assert!(err.to_string().contains("ABN_CLIENT_SECRET"), "{err}");
    }

    #[test]
    fn timeout_is_applied() {
        let args = parse(&[
            "--api-mode",
            "abn",
            "--abn-client-id",
            "a",
            "--abn-client-secret",
            "b",
            "--abn-token-url",
            "c",
            "--abn-base-api-url",
            "d",
            "--timeout-secs",
            "5",
        ]);
        assert_eq!(args.resolve().unwrap().timeout, Duration::from_secs(5));
    }
}
