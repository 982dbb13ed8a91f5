//! Submit command - upload a file for analysis

use std::path::Path;

use anyhow::{Context as _, Result};
use gdetect_client::{Client, Context};

use super::SubmitArgs;
use crate::output::OutputContext;

/// Submit a file and print the uuid assigned by the service
pub async fn submit(
    client: &Client,
    cancel: &Context,
    file: &Path,
    args: &SubmitArgs,
    ctx: &OutputContext,
) -> Result<()> {
    ctx.info(&format!("Submitting {}...", file.display()));
    let uuid = client
        .submit_file(cancel, file, &args.to_options())
        .await
        .with_context(|| format!("Failed to submit {}", file.display()))?;

    ctx.print_uuid(&uuid);
    Ok(())
}
