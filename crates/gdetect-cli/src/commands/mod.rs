//! Command implementations for gdetect

pub mod get;
pub mod submit;
pub mod waitfor;

pub use get::{get, search};
pub use submit::submit;
pub use waitfor::waitfor;

use clap::Args;
use gdetect_client::{AnalysisResult, Client, SubmitOptions};

use crate::output::{OutputContext, ViewUrls};

/// Flags shared by `submit` and `waitfor`
#[derive(Debug, Clone, Default, Args)]
pub struct SubmitArgs {
    /// Tag attached to the submission (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Description of the submission
    #[arg(short, long)]
    pub description: Option<String>,

    /// Ask the service to ignore any cached verdict
    #[arg(long)]
    pub no_cache: bool,

    /// Filename announced to the service instead of the local one
    #[arg(long)]
    pub filename: Option<String>,
}

impl SubmitArgs {
    pub fn to_options(&self) -> SubmitOptions {
        SubmitOptions {
            description: self.description.clone(),
            tags: self.tags.clone(),
            bypass_cache: self.no_cache,
            filename: self.filename.clone(),
        }
    }
}

/// Build the report links of a result, warning about the ones that are missing
fn view_urls(client: &Client, result: &AnalysisResult, ctx: &OutputContext) -> ViewUrls {
    let mut urls = ViewUrls::default();
    match client.extract_token_view_url(result) {
        Ok(url) => urls.token_view_url = Some(url),
        Err(e) => ctx.warn(&format!("Cannot build token view URL: {}", e)),
    }
    match client.extract_expert_view_url(result) {
        Ok(url) => urls.expert_view_url = Some(url),
        Err(e) => ctx.warn(&format!("Cannot build expert view URL: {}", e)),
    }
    urls
}

/// Print a result, with its report links when asked for
fn print_result(client: &Client, result: &AnalysisResult, retrieve_urls: bool, ctx: &OutputContext) {
    let urls = if retrieve_urls {
        view_urls(client, result, ctx)
    } else {
        ViewUrls::default()
    };
    ctx.print_result(result, &urls);
}
