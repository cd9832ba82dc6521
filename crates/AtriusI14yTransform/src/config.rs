//! Transformation defaults and the publisher persons directory.
//!
//! ```text
//! PUBLISHER_IDENTIFIER        default: CH_eHealth
//! PUBLISHER_NAME              default: eHealth Suisse
//! DEFAULT_VERSION             default: 2.0.0
//! DEFAULT_CONCEPT_TYPE        default: CodeList
//! DEFAULT_VALUE_TYPE          default: String
//! DEFAULT_VALUE_MAX_LENGTH    default: 30
//! DEFAULT_PERIOD_START        default: 2024-06-01
//! DEFAULT_PERIOD_END          default: 2100-06-01
//!
//! DEFAULT_RESPONSIBLE_SHORT_NAME / DEFAULT_RESPONSIBLE_EMAIL
//! DEFAULT_DEPUTY_SHORT_NAME      / DEFAULT_DEPUTY_EMAIL
//! ```

use chrono::NaiveDate;
use clap::Args;
use std::collections::BTreeMap;

use crate::error::{TransformError, TransformResult};

/// Values written into every generated document
#[derive(Args, Debug, Clone, PartialEq)]
pub struct TransformDefaults {
    #[arg(long, env = "PUBLISHER_IDENTIFIER", default_value = "CH_eHealth")]
    pub publisher_identifier: String,

    #[arg(long, env = "PUBLISHER_NAME", default_value = "eHealth Suisse")]
    pub publisher_name: String,

    /// Concept version used when none is given on the command line
    #[arg(long, env = "DEFAULT_VERSION", default_value = "2.0.0")]
    pub default_version: String,

    #[arg(long, env = "DEFAULT_CONCEPT_TYPE", default_value = "CodeList")]
    pub concept_type: String,

    #[arg(long, env = "DEFAULT_VALUE_TYPE", default_value = "String")]
    pub value_type: String,

    #[arg(long, env = "DEFAULT_VALUE_MAX_LENGTH", default_value_t = 30)]
    pub value_max_length: u32,

    /// Start date written into every code's period annotation
    #[arg(long, env = "DEFAULT_PERIOD_START", default_value = "2024-06-01")]
    pub period_start: NaiveDate,

    /// End date written into every code's period annotation
    #[arg(long, env = "DEFAULT_PERIOD_END", default_value = "2100-06-01")]
    pub period_end: NaiveDate,
}

impl Default for TransformDefaults {
    fn default() -> Self {
        Self {
            publisher_identifier: "CH_eHealth".to_string(),
            publisher_name: "eHealth Suisse".to_string(),
            default_version: "2.0.0".to_string(),
            concept_type: "CodeList".to_string(),
            value_type: "String".to_string(),
            value_max_length: 30,
            period_start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default(),
            period_end: NaiveDate::from_ymd_opt(2100, 6, 1).unwrap_or_default(),
        }
    }
}

/// Short-name → e-mail options for the responsible person and deputy
#[derive(Args, Debug, Clone, Default)]
pub struct PersonArgs {
    #[arg(long, env = "DEFAULT_RESPONSIBLE_SHORT_NAME")]
    pub responsible_short_name: Option<String>,

    #[arg(long, env = "DEFAULT_RESPONSIBLE_EMAIL", hide_env_values = true)]
    pub responsible_email: Option<String>,

    #[arg(long, env = "DEFAULT_DEPUTY_SHORT_NAME")]
    pub deputy_short_name: Option<String>,

    #[arg(long, env = "DEFAULT_DEPUTY_EMAIL", hide_env_values = true)]
    pub deputy_email: Option<String>,

    /// Register a person (format: KEY=EMAIL), may be repeated
    #[arg(long = "person", value_parser = parse_person)]
    pub persons: Vec<(String, String)>,
}

/// Parse a KEY=EMAIL pair
fn parse_person(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid person format: {}", s))?;
    let (key, email) = (s[..pos].trim(), s[pos + 1..].trim());
    if key.is_empty() || email.is_empty() {
        return Err(format!("invalid person format: {}", s));
    }
    Ok((key.to_string(), email.to_string()))
}

/// Publisher persons, keyed by short name (e.g. `ABC`)
#[derive(Debug, Clone, Default)]
pub struct PersonDirectory {
    emails: BTreeMap<String, String>,
}

impl PersonDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the directory from the environment defaults plus `--person` entries.
    ///
    /// Later entries override earlier ones with the same key.
    pub fn from_args(args: &PersonArgs) -> Self {
        let mut directory = Self::new();
        let defaults = [
            (&args.responsible_short_name, &args.responsible_email),
            (&args.deputy_short_name, &args.deputy_email),
        ];
        for (key, email) in defaults {
            if let (Some(key), Some(email)) = (key, email) {
                directory.insert(key, email);
            }
        }
        for (key, email) in &args.persons {
            directory.insert(key, email);
        }
        directory
    }

    pub fn insert(&mut self, key: &str, email: &str) {
        let (key, email) = (key.trim(), email.trim());
        if key.is_empty() || email.is_empty() {
            return;
        }
        self.emails.insert(key.to_string(), email.to_string());
    }

    pub fn email(&self, key: &str) -> TransformResult<&str> {
        self.emails
            .get(key.trim())
            .map(String::as_str)
            .ok_or_else(|| TransformError::UnknownPerson(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        defaults: TransformDefaults,
        #[command(flatten)]
        persons: PersonArgs,
    }

    #[test]
    fn parsed_defaults_match_default_impl() {
        // skipped when the environment overrides a default
        if std::env::vars().any(|(k, _)| k.starts_with("DEFAULT_") || k.starts_with("PUBLISHER_")) {
            return;
        }
        let cli = TestCli::try_parse_from(["test"]).unwrap();
        assert_eq!(cli.defaults, TransformDefaults::default());
    }

    #[test]
    fn period_dates_are_parsed() {
        let cli = TestCli::try_parse_from(["test", "--period-start", "2025-01-01"]).unwrap();
        assert_eq!(
            cli.defaults.period_start,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
        assert!(TestCli::try_parse_from(["test", "--period-end", "01.01.2100"]).is_err());
    }

    #[test]
    fn persons_come_from_flags() {
        let cli = TestCli::try_parse_from([
            "test",
            "--responsible-short-name",
            "ABC",
            "--responsible-email",
            "abc@example.org",
            "--person",
            "XYZ=xyz@example.org",
            "--person",
            "ABC=other@example.org",
        ])
        .unwrap();
        let directory = PersonDirectory::from_args(&cli.persons);
        assert_eq!(directory.email("ABC").unwrap(), "other@example.org");
        assert_eq!(directory.email("XYZ").unwrap(), "xyz@example.org");
    }

    #[test]
    fn unknown_person_is_an_error() {
        let err = PersonDirectory::new().email("NOPE").unwrap_err();
        assert!(matches!(err, TransformError::UnknownPerson(ref k) if k == "NOPE"));
    }

    #[test]
    fn malformed_person_is_rejected() {
        assert!(parse_person("ABC").is_err());
        assert!(parse_person("=a@b").is_err());
        assert_eq!(
            parse_person("ABC = a@b").unwrap(),
            ("ABC".to_string(), "a@b".to_string())
        );
    }
}
