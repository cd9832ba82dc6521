//! Append-only technical log of failed registry requests.
//!
//! The terminal only gets a one-line summary of a rejection; the full response
//! (body and headers) plus the request line is appended here for later
//! inspection.

use chrono::Local;
use reqwest::header::HeaderMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One failed request, as written to the error log
#[derive(Debug)]
pub struct FailedRequest<'a> {
    pub method: &'a str,
    pub url: &'a str,
    pub status: u16,
    pub body: &'a str,
    pub headers: &'a HeaderMap,
}

#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record. Failing to write the log is reported but never fails the caller.
    pub fn record(&self, failure: &FailedRequest<'_>) {
        if let Err(e) = self.try_record(failure) {
            warn!(
                "Could not write to error log {}: {}",
                self.path.display(),
                e
            );
        }
    }

    fn try_record(&self, failure: &FailedRequest<'_>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "\n--- Error occurred at {} ---", Local::now().to_rfc3339())?;
        writeln!(file, "Status Code: {}", failure.status)?;
        writeln!(file, "Error Response: {}", failure.body)?;
        writeln!(file, "Response Headers:")?;
        for (name, value) in failure.headers {
            writeln!(
                file,
                "    {}: {}",
                name,
                value.to_str().unwrap_or("<binary>")
            )?;
        }
        writeln!(file, "Request: {} {}", failure.method, failure.url)?;
        writeln!(file, "--------------------")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{CONTENT_TYPE, HeaderValue};
    use tempfile::TempDir;

    #[test]
    fn records_are_appended() {
        let dir = TempDir::new().unwrap();
        let log = ErrorLog::new(dir.path().join("nested").join("api_errors_log.txt"));

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/problem+json"));

        for status in [400, 409] {
            log.record(&FailedRequest {
                method: "POST",
                url: "https://api/concepts",
                status,
                body: "{\"detail\":\"nope\"}",
                headers: &headers,
            });
        }

        let contents = fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents.matches("--- Error occurred at").count(), 2);
        assert!(contents.contains("Status Code: 409"));
        assert!(contents.contains("content-type: application/problem+json"));
        assert!(contents.contains("Request: POST https://api/concepts"));
    }
}
