//! GLIMPS Detect HTTP client implementation

use std::fmt;
use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::{GdetectError, Result};
use crate::types::*;

/// Header carrying the API token
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Path prefix shared by every API route
const API_PREFIX: [&str; 3] = ["api", "lite", "v2"];

/// Number of hyphen-separated groups in a token
const TOKEN_GROUPS: usize = 5;
/// Number of hex digits in each token group
const TOKEN_GROUP_LEN: usize = 8;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// GLIMPS Detect API client
///
/// Immutable once built: every method takes `&self`, so one client can be
/// cloned or shared across tasks without locking.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    endpoint: String,
    token: String,
    insecure: bool,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("insecure", &self.insecure)
            .finish()
    }
}

impl Client {
    /// Create a new client
    ///
    /// # Arguments
    /// * `endpoint` - Base URL of the service (e.g., "https://gdetect.example.com")
    /// * `token` - API token, `xxxxxxxx-xxxxxxxx-xxxxxxxx-xxxxxxxx-xxxxxxxx` in hex
    /// * `insecure` - Skip TLS certificate verification on the default HTTP client
    /// * `http_client` - Pre-configured HTTP client (proxy, TLS, ...). When `None`,
    ///   a client with a 30s request timeout and a 10s connect timeout is built.
    ///   `insecure` is ignored for a caller-supplied client.
    pub fn new(
        endpoint: &str,
        token: &str,
        insecure: bool,
        http_client: Option<reqwest::Client>,
    ) -> Result<Self> {
        Self::build(
            endpoint,
            token,
            insecure,
            http_client,
            DEFAULT_TIMEOUT,
            DEFAULT_CONNECT_TIMEOUT,
        )
    }

    /// Create a client from a configuration value
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::build(
            &config.connection.endpoint,
            &config.connection.token,
            config.connection.insecure,
            None,
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    /// Create a client from a YAML config file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(&ClientConfig::from_yaml_file(path)?)
    }

    fn build(
        endpoint: &str,
        token: &str,
        insecure: bool,
        http_client: Option<reqwest::Client>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(GdetectError::Validation("endpoint is empty".into()));
        }
        let base_url = Url::parse(endpoint)
            .map_err(|e| GdetectError::Validation(format!("invalid endpoint {endpoint}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GdetectError::Validation(format!(
                "endpoint {endpoint} cannot be used as a base URL"
            )));
        }

        validate_token(token)?;

        let http = match http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(timeout)
                .connect_timeout(connect_timeout)
                .danger_accept_invalid_certs(insecure)
                .build()?,
        };

        debug!("GLIMPS Detect client created for {}", endpoint);

        Ok(Self {
            http,
            base_url,
            endpoint: endpoint.to_string(),
            token: token.to_string(),
            insecure,
        })
    }

    /// Get the endpoint, without trailing slash
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the API token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether TLS verification is disabled on the default HTTP client
    pub fn is_insecure(&self) -> bool {
        self.insecure
    }

    /// Get a reference to the underlying HTTP client.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit a file for analysis and return the submission uuid
    ///
    /// The file is streamed as the `file` part of a multipart form. Its
    /// announced name is `options.filename` or else the path's base name.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn submit_file(
        &self,
        ctx: &Context,
        path: impl AsRef<Path>,
        options: &SubmitOptions,
    ) -> Result<String> {
        let path = path.as_ref();

        ctx.run(async {
            let form = build_submit_form(path, options).await?;
            let url = self.api_url(&["submit"])?;
            debug!("Submitting {} to {}", path.display(), url);

            let body = self.send(self.http.post(url).multipart(form)).await?;
            let response: SubmitResponse = decode(&body)?;
            if !response.status {
                return Err(GdetectError::submission(&body));
            }

            info!(uuid = %response.uuid, "File submitted");
            Ok(response.uuid)
        })
        .await
    }

    // =========================================================================
    // Results
    // =========================================================================

    /// Get the analysis result of a submission
    #[instrument(skip(self, ctx))]
    pub async fn get_result_by_uuid(&self, ctx: &Context, uuid: &str) -> Result<AnalysisResult> {
        let url = self.api_url(&["results", uuid])?;
        self.get_json(ctx, url).await
    }

    /// Look up the latest analysis result of a file by its SHA-256
    #[instrument(skip(self, ctx))]
    pub async fn get_result_by_sha256(
        &self,
        ctx: &Context,
        sha256: &str,
    ) -> Result<AnalysisResult> {
        let url = self.api_url(&["search", sha256])?;
        self.get_json(ctx, url).await
    }

    /// Get the complete analysis report of a submission, undecoded
    #[instrument(skip(self, ctx))]
    pub async fn get_full_submission_by_uuid(
        &self,
        ctx: &Context,
        uuid: &str,
    ) -> Result<serde_json::Value> {
        let url = self.api_url(&["results", uuid, "full"])?;
        self.get_json(ctx, url).await
    }

    // =========================================================================
    // View URLs
    // =========================================================================

    /// Build the token view URL of a result
    ///
    /// Fails with [`GdetectError::MissingField`] while the service has not
    /// supplied a token yet.
    pub fn extract_token_view_url(&self, result: &AnalysisResult) -> Result<String> {
        if result.token.is_empty() {
            return Err(GdetectError::MissingField("token"));
        }
        Ok(format!(
            "{}/expert/en/analysis-redirect/{}",
            self.endpoint, result.token
        ))
    }

    /// Build the expert view URL of a result
    ///
    /// Fails with [`GdetectError::MissingField`] while the service has not
    /// supplied a submission id yet.
    pub fn extract_expert_view_url(&self, result: &AnalysisResult) -> Result<String> {
        if result.sid.is_empty() {
            return Err(GdetectError::MissingField("sid"));
        }
        Ok(format!(
            "{}/expert/en/analysis/advanced/{}",
            self.endpoint, result.sid
        ))
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// Build an API URL, percent-encoding each segment
    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GdetectError::Validation(format!(
                    "endpoint {} cannot be used as a base URL",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(API_PREFIX.iter().chain(segments.iter()));
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, ctx: &Context, url: Url) -> Result<T> {
        debug!("GET {}", url);
        ctx.run(async {
            let body = self.send(self.http.get(url)).await?;
            decode(&body)
        })
        .await
    }

    /// Send an authenticated request and return the body of a 2xx response
    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request.header(AUTH_HEADER, &self.token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            debug!(%status, "Endpoint returned an error status");
            Err(GdetectError::from_status(status, &body))
        }
    }
}

/// Check the `xxxxxxxx-xxxxxxxx-xxxxxxxx-xxxxxxxx-xxxxxxxx` hex token shape
fn validate_token(token: &str) -> Result<()> {
    let groups: Vec<&str> = token.split('-').collect();
    let well_formed = groups.len() == TOKEN_GROUPS
        && groups
            .iter()
            .all(|group| group.len() == TOKEN_GROUP_LEN && hex::decode(group).is_ok());

    if well_formed {
        Ok(())
    } else {
        Err(GdetectError::Validation(
            "token must be 5 groups of 8 hexadecimal characters separated by '-'".into(),
        ))
    }
}

/// Build the multipart submission form, streaming the file content
async fn build_submit_form(path: &Path, options: &SubmitOptions) -> Result<Form> {
    let file_error = |source| GdetectError::File {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(file_error)?;
    let metadata = file.metadata().await.map_err(file_error)?;
    if !metadata.is_file() {
        return Err(file_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    let length = metadata.len();

    let filename = options
        .filename
        .clone()
        .or_else(|| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "file".to_string());

    let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
        .file_name(filename)
        .mime_str("application/octet-stream")?;

    let mut form = Form::new();
    if let Some(description) = &options.description {
        form = form.text("description", description.clone());
    }
    if !options.tags.is_empty() {
        form = form.text("tags", options.tags.join(","));
    }
    if options.bypass_cache {
        form = form.text("bypass-cache", "true");
    }
    Ok(form.part("file", part))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| GdetectError::decode(e, body))
}
