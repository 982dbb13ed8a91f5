//! Request and response types for the GLIMPS Detect client

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Default interval between two result polls
pub const DEFAULT_PULL_TIME: Duration = Duration::from_secs(1);
/// Default overall deadline of a wait loop
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(180);

// =============================================================================
// Results
// =============================================================================

/// Analysis outcome as reported by the service
///
/// Only `uuid`, `done`, `token` and `sid` drive client behaviour. The other
/// named fields are decoded for convenience and everything the service adds
/// beyond them is kept untouched in [`AnalysisResult::extra`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: bool,
    /// Completion flag, the only signal that ends a wait loop
    #[serde(default, deserialize_with = "null_as_default")]
    pub done: bool,
    /// Opaque token used to build the token view URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub token: String,
    /// Opaque submission id used to build the expert view URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub sid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sha256: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sha1: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub md5: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ssdeep: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_malware: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub malwares: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filenames: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filetype: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AnalysisResult {
    /// Whether the service flagged the file as malicious
    pub fn is_malware(&self) -> bool {
        self.is_malware
    }

    /// Look up a field that is not modelled by this struct
    pub fn extra_field(&self, name: &str) -> Option<&serde_json::Value> {
        self.extra.get(name)
    }
}

/// Decode `null` as the field's default value
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response to a submission request
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SubmitResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: bool,
}

// =============================================================================
// Options
// =============================================================================

/// Options attached to a file submission
///
/// Unset fields are not sent, so the service defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Free-text description of the submission
    pub description: Option<String>,
    /// Labels, sent comma-joined in order
    pub tags: Vec<String>,
    /// Ask the service to ignore any cached verdict
    pub bypass_cache: bool,
    /// Filename announced to the service instead of the path's base name
    pub filename: Option<String>,
}

impl SubmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Options for [`Client::wait_for_file`](crate::Client::wait_for_file)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitForOptions {
    /// Options forwarded to the submission
    pub submit: SubmitOptions,
    /// Interval between two result polls
    pub pull_time: Duration,
    /// Overall deadline, measured from the start of the call
    pub timeout: Duration,
}

impl Default for WaitForOptions {
    fn default() -> Self {
        Self {
            submit: SubmitOptions::default(),
            pull_time: DEFAULT_PULL_TIME,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl WaitForOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit_options(mut self, submit: SubmitOptions) -> Self {
        self.submit = submit;
        self
    }

    pub fn with_pull_time(mut self, pull_time: Duration) -> Self {
        self.pull_time = pull_time;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Poll interval, falling back to the default for a zero value
    pub(crate) fn effective_pull_time(&self) -> Duration {
        if self.pull_time.is_zero() {
            DEFAULT_PULL_TIME
        } else {
            self.pull_time
        }
    }

    /// Overall deadline, falling back to the default for a zero value
    pub(crate) fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_WAIT_TIMEOUT
        } else {
            self.timeout
        }
    }
}
