//! GLIMPS Detect Client Library
//!
//! Submits files to a GLIMPS Detect service for malware analysis, polls for
//! the verdict and builds the human-facing report URLs.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use gdetect_client::{Client, Context, SubmitOptions, WaitForOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(
//!         "https://gdetect.example.com",
//!         "abcdef01-23456789-abcdef01-23456789-abcdef01",
//!         false,
//!         None,
//!     )?;
//!
//!     // Submit and wait up to two minutes for the verdict
//!     let options = WaitForOptions::new()
//!         .with_submit_options(SubmitOptions::new().with_tags(["triage"]))
//!         .with_timeout(Duration::from_secs(120));
//!     let result = client
//!         .wait_for_file(&Context::background(), "/tmp/sample.bin", &options)
//!         .await?;
//!
//!     println!("{} malware: {}", result.uuid, result.is_malware);
//!     println!("{}", client.extract_expert_view_url(&result)?);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Cancellation
//!
//! Every network operation takes a [`Context`]. Cancelling its token or
//! reaching its deadline aborts the in-flight request and returns
//! [`GdetectError::Cancelled`] or [`GdetectError::Timeout`]:
//!
//! ```rust,ignore
//! let ctx = Context::background().with_timeout(Duration::from_secs(10));
//! let result = client.get_result_by_sha256(&ctx, &sha256).await?;
//! ```
//!
//! # Testing
//!
//! The `testing` module runs an axum router in-process with a ready client:
//!
//! ```rust,ignore
//! use gdetect_client::testing::TestServer;
//!
//! let server = TestServer::start(router).await?;
//! let uuid = server.client.submit_file(&ctx, path, &options).await?;
//! ```

mod client;
mod config;
mod context;
mod error;
pub mod testing;
mod types;
mod wait;

pub use client::{Client, AUTH_HEADER};
pub use config::{
    ClientConfig, ClientConfigBuilder, ConnectionConfig, TimeoutsConfig, WaitConfig,
};
pub use context::Context;
pub use error::{GdetectError, Result};
pub use types::*;
pub use wait::{WaitPhase, WaitProgress};

// Re-export the cancellation token so callers need no direct tokio-util dependency
pub use tokio_util::sync::CancellationToken;
