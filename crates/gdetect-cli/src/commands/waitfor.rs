//! Waitfor command - submit a file and wait for its verdict

use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use gdetect_client::{Client, Context, WaitForOptions, WaitPhase, WaitProgress};
use indicatif::{ProgressBar, ProgressStyle};

use super::{print_result, SubmitArgs};
use crate::output::OutputContext;

/// Submit a file, then poll until the analysis is done
#[allow(clippy::too_many_arguments)]
pub async fn waitfor(
    client: &Client,
    cancel: &Context,
    file: &Path,
    args: &SubmitArgs,
    timeout: Duration,
    pull_time: Duration,
    retrieve_urls: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let options = WaitForOptions::new()
        .with_submit_options(args.to_options())
        .with_timeout(timeout)
        .with_pull_time(pull_time);

    let pb = if ctx.is_interactive() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    } else {
        ProgressBar::hidden()
    };

    let progress_callback = |progress: &WaitProgress| {
        pb.set_message(progress_message(progress));
    };

    let outcome = client
        .wait_for_file_with_progress(cancel, file, &options, Some(progress_callback))
        .await;

    match &outcome {
        Ok(_) => pb.finish_and_clear(),
        Err(_) => pb.abandon_with_message("Failed"),
    }
    let result = outcome.with_context(|| format!("Failed to analyse {}", file.display()))?;

    print_result(client, &result, retrieve_urls, ctx);
    Ok(())
}

/// Spinner text for a progress snapshot
fn progress_message(progress: &WaitProgress) -> String {
    match (progress.phase, progress.uuid.as_deref()) {
        (WaitPhase::Submitting, _) => "Submitting...".to_string(),
        (WaitPhase::Polling, Some(uuid)) if progress.attempts > 0 => {
            format!("Analysing {} (poll {})", uuid, progress.attempts)
        }
        (WaitPhase::Polling, Some(uuid)) => format!("Submitted as {}", uuid),
        (phase, _) => phase.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn progress(phase: WaitPhase, uuid: Option<&str>, attempts: u32) -> WaitProgress {
        WaitProgress {
            phase,
            uuid: uuid.map(str::to_string),
            attempts,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_progress_message() {
        assert_eq!(
            progress_message(&progress(WaitPhase::Submitting, None, 0)),
            "Submitting..."
        );
        assert_eq!(
            progress_message(&progress(WaitPhase::Polling, Some("1234"), 0)),
            "Submitted as 1234"
        );
        assert_eq!(
            progress_message(&progress(WaitPhase::Polling, Some("1234"), 3)),
            "Analysing 1234 (poll 3)"
        );
        assert_eq!(
            progress_message(&progress(WaitPhase::Done, Some("1234"), 3)),
            "Done"
        );
    }
}
