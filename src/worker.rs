//! Runs a restore on a background thread so the caller can keep draining
//! progress events.

use std::{
    io,
    sync::mpsc::{Receiver, channel},
    thread::{self, JoinHandle},
};

use tracing::{error, info};

use crate::{
    error::RestoreError,
    progress::{CancelToken, Reporter, RestoreEvent, RestoreOutcome},
    restore::{RestoreRequest, run_restore},
};

/// Spawns restore runs.
pub struct RestoreWorker;

impl RestoreWorker {
    pub fn spawn(request: RestoreRequest) -> io::Result<RestoreHandle> {
        Self::spawn_with_cancel(request, CancelToken::new())
    }

    /// Like [`RestoreWorker::spawn`], but observes a token the caller already
    /// holds, so it can be cancelled before the thread starts.
    pub fn spawn_with_cancel(
        request: RestoreRequest,
        cancel: CancelToken,
    ) -> io::Result<RestoreHandle> {
        let (sender, events) = channel();

        let thread = {
            let cancel = cancel.clone();
            thread::Builder::new()
                .name("restore-worker".into())
                .spawn(move || {
                    let reporter = Reporter::new(sender);
                    let outcome = execute(&request, &reporter, &cancel);
                    reporter.finished(outcome.clone());
                    outcome
                })?
        };

        Ok(RestoreHandle {
            events,
            cancel,
            thread,
        })
    }
}

fn execute(request: &RestoreRequest, reporter: &Reporter, cancel: &CancelToken) -> RestoreOutcome {
    info!("Restoring {} ({})", request.backup.display(), request.kind);

    match run_restore(request, reporter, cancel) {
        Ok(report) => RestoreOutcome::Completed {
            backup: request.backup.clone(),
            report,
        },
        Err(RestoreError::Cancelled) => {
            info!("Restore cancelled");
            RestoreOutcome::Cancelled
        }
        Err(e) => {
            error!("Restore failed: {e}");
            reporter.message(format!("Error: {e}"));
            RestoreOutcome::Failed(e.to_string())
        }
    }
}

/// A restore running in the background.
pub struct RestoreHandle {
    events: Receiver<RestoreEvent>,
    cancel: CancelToken,
    thread: JoinHandle<RestoreOutcome>,
}

impl RestoreHandle {
    /// Event stream. Ends with [`RestoreEvent::Finished`].
    pub fn events(&self) -> &Receiver<RestoreEvent> {
        &self.events
    }

    /// Asks the worker to stop before its next folder or file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Waits for the worker and returns how it ended.
    pub fn join(self) -> RestoreOutcome {
        self.thread
            .join()
            .unwrap_or_else(|_| RestoreOutcome::Failed("restore worker panicked".into()))
    }
}
