//! HTTP client for the I14Y registry's concept and codelist endpoints.
//!
//! Every call is sequential and authenticated with a bearer token obtained
//! from [`TokenCache`]. A `401` answer invalidates the cached token and the
//! request is replayed exactly once with a fresh one.
//!
//! ## Endpoints
//!
//! ```text
//! POST   {base}/concepts                                            create concept
//! GET    {base}/concepts?conceptIdentifier=&publisherIdentifier=&registrationStatus=
//! GET    {base}/concepts/{id}
//! DELETE {base}/concepts/{id}
//! GET    {base}/concepts/{id}/codelist-entries
//! DELETE {base}/concepts/{id}/codelist-entries
//! POST   {base}/concepts/{id}/codelist-entries/imports/json         multipart upload
//! ```

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use url::Url;

use crate::auth::TokenCache;
use crate::config::ApiConfig;
use crate::error::{I14yError, I14yResult};
use crate::error_log::{ErrorLog, FailedRequest};
use crate::output::to_json_pretty;

const ALREADY_EXISTS_HINT: &str = "The concept you're trying to post already exists on the registry. \
Delete its codelist entries (delete-codelist) before re-posting.";

/// Filters for listing concepts
#[derive(Debug, Clone, Default)]
pub struct ConceptQuery {
    /// Concept identifier (the value set OID)
    pub identifier: Option<String>,
    /// Publisher identifier, e.g. `CH_eHealth`
    pub publisher: Option<String>,
    /// Registration status, e.g. `Recorded`
    pub status: Option<String>,
}

/// Minimal view of a concept as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptSummary {
    pub id: String,
    #[serde(default)]
    pub identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConceptPage {
    #[serde(default)]
    data: Vec<ConceptSummary>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiProblem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Sequential REST client for the I14Y registry.
pub struct I14yClient {
    http: Client,
    base_url: Url,
    tokens: TokenCache,
    error_log: Option<ErrorLog>,
}

impl I14yClient {
    /// Create a client from resolved connection settings.
    pub fn new(config: ApiConfig) -> I14yResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let base_url = Url::parse(&config.base_api_url).map_err(|e| {
            I14yError::Config(format!(
                "invalid base API URL '{}': {}",
                config.base_api_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(I14yError::Config(format!(
                "base API URL '{}' cannot carry a path",
                config.base_api_url
            )));
        }

        let tokens = TokenCache::new(
            http.clone(),
            config.token_url,
            config.client_id,
            config.client_secret,
        );

        Ok(Self {
            http,
            base_url,
            tokens,
            error_log: None,
        })
    }

    /// Append technical details of failed requests to `log`.
    pub fn with_error_log(mut self, log: ErrorLog) -> Self {
        self.error_log = Some(log);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create a new concept from a JSON payload (`{"data": {...}}`).
    pub async fn post_concept(&self, payload: &Value) -> I14yResult<Value> {
        let url = self.endpoint(&["concepts"])?;
        info!("Posting concept to {}", url);
        let result = self
            .execute(Method::POST, &url, |http| Ok(http.post(url.clone()).json(payload)))
            .await?;
        info!("Concept posted successfully");
        Ok(result)
    }

    /// Create a new concept from a transformed concept file.
    pub async fn post_concept_file(&self, path: &Path) -> I14yResult<Value> {
        let contents = read_existing(path)?;
        let payload: Value = serde_json::from_slice(&contents)?;
        self.post_concept(&payload).await
    }

    /// Import a codelist-entries file into an existing concept.
    pub async fn post_codelist_entries(&self, path: &Path, concept_id: &str) -> I14yResult<Value> {
        let concept_id = require_id(concept_id)?;
        let contents = read_existing(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "codelist-entries.json".to_string());

        let url = self.endpoint(&[
            "concepts",
            concept_id,
            "codelist-entries",
            "imports",
            "json",
        ])?;
        info!("Posting {} to {}", path.display(), url);

        let result = self
            .execute(Method::POST, &url, |http| {
                let part = Part::bytes(contents.clone())
                    .file_name(file_name.clone())
                    .mime_str("application/json")?;
                Ok(http.post(url.clone()).multipart(Form::new().part("file", part)))
            })
            .await?;
        info!("Codelist entries posted successfully");
        Ok(result)
    }

    /// Fetch all codelist entries of a concept.
    pub async fn get_codelist_entries(&self, concept_id: &str) -> I14yResult<Value> {
        let concept_id = require_id(concept_id)?;
        let url = self.endpoint(&["concepts", concept_id, "codelist-entries"])?;
        info!("Fetching codelist entries from {}", url);
        self.execute(Method::GET, &url, |http| Ok(http.get(url.clone())))
            .await
    }

    /// Remove all codelist entries of a concept.
    pub async fn delete_codelist_entries(&self, concept_id: &str) -> I14yResult<Value> {
        let concept_id = require_id(concept_id)?;
        let url = self.endpoint(&["concepts", concept_id, "codelist-entries"])?;
        info!("Sending DELETE request to {}", url);
        let result = self
            .execute(Method::DELETE, &url, |http| Ok(http.delete(url.clone())))
            .await?;
        info!("Codelist entries deleted");
        Ok(result)
    }

    /// Replace the codelist entries of a concept: delete, then import `path`.
    ///
    /// The import only runs once the delete has been acknowledged. A `404` on
    /// delete means there was nothing to remove and is not treated as failure.
    pub async fn update_codelist_entries(&self, path: &Path, concept_id: &str) -> I14yResult<Value> {
        // Fail on a missing file before touching the registry.
        if !path.is_file() {
            return Err(I14yError::NotFound(path.to_path_buf()));
        }

        match self.delete_codelist_entries(concept_id).await {
            Ok(_) => {}
            Err(err) if err.status() == Some(StatusCode::NOT_FOUND.as_u16()) => {
                warn!("Concept {} had no codelist entries to delete", concept_id);
            }
            Err(err) => return Err(err),
        }

        self.post_codelist_entries(path, concept_id).await
    }

    /// Fetch a single concept by its registry id.
    pub async fn get_concept(&self, concept_id: &str) -> I14yResult<Value> {
        let concept_id = require_id(concept_id)?;
        let url = self.endpoint(&["concepts", concept_id])?;
        info!("Fetching concept from {}", url);
        self.execute(Method::GET, &url, |http| Ok(http.get(url.clone())))
            .await
    }

    /// Delete a concept by its registry id.
    pub async fn delete_concept(&self, concept_id: &str) -> I14yResult<Value> {
        let concept_id = require_id(concept_id)?;
        let url = self.endpoint(&["concepts", concept_id])?;
        info!("Sending DELETE request to {}", url);
        self.execute(Method::DELETE, &url, |http| Ok(http.delete(url.clone())))
            .await
    }

    /// List concepts matching `query`.
    pub async fn get_concepts(&self, query: &ConceptQuery) -> I14yResult<Value> {
        let mut url = self.endpoint(&["concepts"])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(identifier) = &query.identifier {
                pairs.append_pair("conceptIdentifier", identifier);
            }
            if let Some(publisher) = &query.publisher {
                pairs.append_pair("publisherIdentifier", publisher);
            }
            if let Some(status) = &query.status {
                pairs.append_pair("registrationStatus", status);
            }
        }
        // `query_pairs_mut` leaves a bare `?` when nothing was appended
        if url.query() == Some("") {
            url.set_query(None);
        }

        info!("Fetching concepts from {}", url);
        self.execute(Method::GET, &url, |http| Ok(http.get(url.clone())))
            .await
    }

    /// Search concepts by their identifier (value set OID).
    pub async fn find_concepts_by_identifier(
        &self,
        identifier: &str,
    ) -> I14yResult<Vec<ConceptSummary>> {
        let query = ConceptQuery {
            identifier: Some(identifier.to_string()),
            ..Default::default()
        };
        let response = self.get_concepts(&query).await?;
        parse_concept_page(response)
    }

    /// Registry id of the first concept carrying `identifier`, if any.
    pub async fn find_concept_id(&self, identifier: &str) -> I14yResult<Option<String>> {
        let found = self.find_concepts_by_identifier(identifier).await?;
        Ok(found.into_iter().next().map(|c| c.id))
    }

    fn endpoint(&self, segments: &[&str]) -> I14yResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                I14yError::Config(format!("base API URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send an authenticated request, replaying it once after a `401`.
    async fn execute<F>(&self, method: Method, url: &Url, build: F) -> I14yResult<Value>
    where
        F: Fn(&Client) -> I14yResult<RequestBuilder>,
    {
        let mut retried = false;
        loop {
            let token = self.tokens.bearer().await?;
            let response = build(&self.http)?
                .bearer_auth(&token)
                .header(header::ACCEPT, "application/json")
                .send()
                .await?;

            if response.status() == StatusCode::UNAUTHORIZED && !retried {
                warn!("{} {} was rejected with 401, refreshing token", method, url);
                self.tokens.invalidate().await;
                retried = true;
                continue;
            }

            return self.read_response(&method, url, response).await;
        }
    }

    async fn read_response(
        &self,
        method: &Method,
        url: &Url,
        response: Response,
    ) -> I14yResult<Value> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if status.is_success() {
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)));
        }

        if let Some(log) = &self.error_log {
            log.record(&FailedRequest {
                method: method.as_str(),
                url: url.as_str(),
                status: status.as_u16(),
                body: &body,
                headers: &headers,
            });
        }

        Err(problem_error(status, &body))
    }
}

/// Write a response document as JSON indented by four spaces.
pub fn save_response_to_file(value: &Value, path: &Path) -> I14yResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_json_pretty(value)?)?;
    info!("Response written to {}", path.display());
    Ok(())
}

fn parse_concept_page(response: Value) -> I14yResult<Vec<ConceptSummary>> {
    match response {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => Ok(serde_json::from_value(response)?),
        other => Ok(serde_json::from_value::<ConceptPage>(other)?.data),
    }
}

fn problem_error(status: StatusCode, body: &str) -> I14yError {
    let problem: ApiProblem = serde_json::from_str(body).unwrap_or_default();

    let title = problem
        .title
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
    let detail = problem
        .detail
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let hint = detail
        .contains("already exists")
        .then(|| ALREADY_EXISTS_HINT.to_string());

    I14yError::Api {
        status: status.as_u16(),
        title,
        detail,
        hint,
    }
}

fn require_id(concept_id: &str) -> I14yResult<&str> {
    let trimmed = concept_id.trim();
    if trimmed.is_empty() {
        return Err(I14yError::InvalidInput("concept id must not be empty".to_string()));
    }
    Ok(trimmed)
}

fn read_existing(path: &Path) -> I14yResult<Vec<u8>> {
    if !path.is_file() {
        return Err(I14yError::NotFound(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> I14yClient {
        I14yClient::new(ApiConfig::new("id", "secret", "https://idp/token", base)).unwrap()
    }

    #[test]
    fn endpoints_extend_the_base_path() {
        let c = client("https://api.example.org/api/partner/v1/");
        assert_eq!(
            c.endpoint(&["concepts", "abc", "codelist-entries"])
                .unwrap()
                .as_str(),
            "https://api.example.org/api/partner/v1/concepts/abc/codelist-entries"
        );

        let bare = client("http://127.0.0.1:8080");
        assert_eq!(
            bare.endpoint(&["concepts"]).unwrap().as_str(),
            "http://127.0.0.1:8080/concepts"
        );
    }

    #[test]
    fn base_url_is_the_configured_registry() {
        let c = client("https://api.example.org/api/partner/v1/");
        assert_eq!(c.base_url().as_str(), "https://api.example.org/api/partner/v1/");
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let result = I14yClient::new(ApiConfig::new("id", "secret", "t", "not a url"));
        assert!(matches!(result, Err(I14yError::Config(_))));
    }

    #[test]
    fn problem_document_is_parsed() {
        let err = problem_error(
            StatusCode::CONFLICT,
            r#"{"title":"Conflict","detail":"Concept with identifier 2.16.756 already exists. "}"#,
        );
        match err {
            I14yError::Api {
                status,
                title,
                detail,
                hint,
            } => {
                assert_eq!(status, 409);
                assert_eq!(title, "Conflict");
                assert_eq!(detail, "Concept with identifier 2.16.756 already exists.");
                assert!(hint.unwrap().contains("delete-codelist"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn plain_text_error_body_becomes_detail() {
        let err = problem_error(StatusCode::BAD_GATEWAY, "upstream down\n");
        match err {
            I14yError::Api {
                title, detail, hint, ..
            } => {
                assert_eq!(title, "Bad Gateway");
                assert_eq!(detail, "upstream down");
                assert!(hint.is_none());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn concept_page_accepts_wrapped_and_bare_lists() {
        let wrapped = json!({"data": [{"id": "08dd", "identifier": "2.16.756.5.30"}]});
        assert_eq!(parse_concept_page(wrapped).unwrap()[0].id, "08dd");

        let bare = json!([{"id": "a"}, {"id": "b"}]);
        assert_eq!(parse_concept_page(bare).unwrap().len(), 2);

        let empty = json!({"data": []});
        assert!(parse_concept_page(empty).unwrap().is_empty());
        assert!(parse_concept_page(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn blank_concept_id_is_rejected() {
        assert!(matches!(require_id("  "), Err(I14yError::InvalidInput(_))));
        assert_eq!(require_id(" abc ").unwrap(), "abc");
    }

    #[test]
    fn responses_are_saved_pretty_printed() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("concept.json");
        save_response_to_file(&json!({"data": {"a": 1}}), &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n    \"data\": {\n        \"a\": 1\n    }\n}");
    }
}
