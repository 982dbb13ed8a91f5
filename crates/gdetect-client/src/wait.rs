//! Submit-and-wait lifecycle

use std::path::Path;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::client::Client;
use crate::context::Context;
use crate::error::{GdetectError, Result};
use crate::types::{AnalysisResult, WaitForOptions};

/// Phases of [`Client::wait_for_file`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    /// Uploading the file
    Submitting,
    /// Waiting for the analysis to complete
    Polling,
    /// Analysis complete
    Done,
    /// Submission or polling failed
    Failed,
    /// Deadline expired or context cancelled
    TimedOut,
}

impl WaitPhase {
    /// Whether the loop has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::TimedOut)
    }
}

impl std::fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitting => write!(f, "Submitting"),
            Self::Polling => write!(f, "Polling"),
            Self::Done => write!(f, "Done"),
            Self::Failed => write!(f, "Failed"),
            Self::TimedOut => write!(f, "TimedOut"),
        }
    }
}

/// Snapshot handed to the progress callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitProgress {
    pub phase: WaitPhase,
    /// Submission uuid, once the service assigned one
    pub uuid: Option<String>,
    /// Number of result polls issued so far
    pub attempts: u32,
    /// Time since the call started
    pub elapsed: Duration,
}

/// Progress reporting state for one wait loop
struct Tracker<F> {
    started: Instant,
    uuid: Option<String>,
    attempts: u32,
    callback: Option<F>,
}

impl<F: FnMut(&WaitProgress)> Tracker<F> {
    fn report(&mut self, phase: WaitPhase) {
        if let Some(cb) = self.callback.as_mut() {
            cb(&WaitProgress {
                phase,
                uuid: self.uuid.clone(),
                attempts: self.attempts,
                elapsed: self.started.elapsed(),
            });
        }
    }

    fn fail(&mut self, err: GdetectError) -> GdetectError {
        let phase = if err.is_cancellation() {
            WaitPhase::TimedOut
        } else {
            WaitPhase::Failed
        };
        self.report(phase);
        err
    }
}

impl Client {
    /// Submit a file and wait until its analysis is done
    ///
    /// See [`Client::wait_for_file_with_progress`].
    pub async fn wait_for_file(
        &self,
        ctx: &Context,
        path: impl AsRef<Path>,
        options: &WaitForOptions,
    ) -> Result<AnalysisResult> {
        self.wait_for_file_with_progress::<fn(&WaitProgress)>(ctx, path, options, None)
            .await
    }

    /// Submit a file, then poll its result until the service marks it done
    ///
    /// 1. Submit once. A submission failure is returned as is.
    /// 2. Every `options.pull_time`, fetch the result by uuid. The first
    ///    result with `done == true` is returned. Transient failures
    ///    (transport errors, 5xx, 408/429) are logged and polling goes on;
    ///    any other failure ends the loop.
    /// 3. Once `options.timeout` has elapsed since the call started, or `ctx`
    ///    is cancelled or past its deadline, fail with
    ///    [`GdetectError::Timeout`] or [`GdetectError::Cancelled`].
    ///
    /// `progress_callback` is invoked on every phase change and poll.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn wait_for_file_with_progress<F>(
        &self,
        ctx: &Context,
        path: impl AsRef<Path>,
        options: &WaitForOptions,
        progress_callback: Option<F>,
    ) -> Result<AnalysisResult>
    where
        F: FnMut(&WaitProgress),
    {
        let ctx = ctx.with_timeout(options.effective_timeout());
        let pull_time = options.effective_pull_time();
        let mut tracker = Tracker {
            started: Instant::now(),
            uuid: None,
            attempts: 0,
            callback: progress_callback,
        };

        // Submitting
        tracker.report(WaitPhase::Submitting);
        let uuid = match self.submit_file(&ctx, path, &options.submit).await {
            Ok(uuid) => uuid,
            Err(e) => return Err(tracker.fail(e)),
        };
        tracker.uuid = Some(uuid.clone());

        // Polling
        tracker.report(WaitPhase::Polling);

        loop {
            let pause = ctx
                .run(async {
                    tokio::time::sleep(pull_time).await;
                    Ok(())
                })
                .await;
            if let Err(e) = pause {
                warn!(%uuid, attempts = tracker.attempts, "Stopped waiting: {}", e);
                return Err(tracker.fail(e));
            }

            tracker.attempts += 1;
            match self.get_result_by_uuid(&ctx, &uuid).await {
                Ok(result) if result.done => {
                    info!(%uuid, attempts = tracker.attempts, "Analysis complete");
                    tracker.report(WaitPhase::Done);
                    return Ok(result);
                }
                Ok(_) => {
                    debug!(%uuid, attempts = tracker.attempts, "Analysis still running");
                    tracker.report(WaitPhase::Polling);
                }
                Err(e) if e.is_transient() => {
                    warn!(%uuid, attempts = tracker.attempts, "Transient polling failure: {}", e);
                    tracker.report(WaitPhase::Polling);
                }
                Err(e) => return Err(tracker.fail(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(!WaitPhase::Submitting.is_terminal());
        assert!(!WaitPhase::Polling.is_terminal());
        assert!(WaitPhase::Done.is_terminal());
        assert!(WaitPhase::Failed.is_terminal());
        assert!(WaitPhase::TimedOut.is_terminal());
    }

    #[test]
    fn test_failure_phase() {
        let mut phases = Vec::new();
        let mut tracker = Tracker {
            started: Instant::now(),
            uuid: None,
            attempts: 0,
            callback: Some(|p: &WaitProgress| phases.push(p.phase)),
        };
        let _ = tracker.fail(GdetectError::Timeout);
        let _ = tracker.fail(GdetectError::Cancelled);
        let _ = tracker.fail(GdetectError::MissingField("sid"));
        drop(tracker);
        assert_eq!(
            phases,
            vec![WaitPhase::TimedOut, WaitPhase::TimedOut, WaitPhase::Failed]
        );
    }
}
