//! Get and search commands - fetch existing results

use anyhow::{Context as _, Result};
use gdetect_client::{Client, Context};

use super::print_result;
use crate::output::OutputContext;

/// Fetch a result by uuid, or the full report with `full`
pub async fn get(
    client: &Client,
    cancel: &Context,
    uuid: &str,
    full: bool,
    retrieve_urls: bool,
    ctx: &OutputContext,
) -> Result<()> {
    if full {
        let report = client
            .get_full_submission_by_uuid(cancel, uuid)
            .await
            .with_context(|| format!("Failed to get full report of {}", uuid))?;
        ctx.print_json(&report);
        return Ok(());
    }

    let result = client
        .get_result_by_uuid(cancel, uuid)
        .await
        .with_context(|| format!("Failed to get result of {}", uuid))?;
    print_result(client, &result, retrieve_urls, ctx);
    Ok(())
}

/// Fetch the latest result for a file hash
pub async fn search(
    client: &Client,
    cancel: &Context,
    sha256: &str,
    retrieve_urls: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let result = client
        .get_result_by_sha256(cancel, sha256)
        .await
        .with_context(|| format!("Failed to search {}", sha256))?;
    print_result(client, &result, retrieve_urls, ctx);
    Ok(())
}
