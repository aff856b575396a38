//! Progress events and cancellation shared between the restore worker and
//! whoever is watching it.

use std::{
    fmt,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
    },
};

use crate::restore::RestoreReport;

/// An event emitted by a running restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreEvent {
    /// A human readable status line.
    Message(String),

    /// Overall completion in percent, 0 to 100.
    Progress(u8),

    /// Always the last event of a run.
    Finished(RestoreOutcome),
}

/// How a restore run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Completed {
        backup: PathBuf,
        report: RestoreReport,
    },
    Cancelled,
    Failed(String),
}

impl RestoreOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Cooperative cancellation flag, checked before every folder and file.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where a running restore sends its events.
///
/// A dropped receiver is not an error: the restore keeps going even if nobody
/// is listening any more.
pub struct Reporter {
    sink: Box<dyn Fn(RestoreEvent) + Send>,
}

impl Reporter {
    pub fn new(sender: Sender<RestoreEvent>) -> Self {
        Self::from_fn(move |event| {
            let _ = sender.send(event);
        })
    }

    /// Hands every event to `sink` on the restoring thread, in order.
    pub fn from_fn(sink: impl Fn(RestoreEvent) + Send + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }

    pub fn message(&self, message: impl Into<String>) {
        self.send(RestoreEvent::Message(message.into()));
    }

    pub fn progress(&self, done: usize, total: usize) {
        self.send(RestoreEvent::Progress(percent(done, total)));
    }

    pub fn finished(&self, outcome: RestoreOutcome) {
        self.send(RestoreEvent::Finished(outcome));
    }

    fn send(&self, event: RestoreEvent) {
        (self.sink)(event);
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}

/// Integer percentage, truncated, clamped to 100. An empty total counts as
/// done.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }

    let value = (done.min(total) * 100) / total;
    u8::try_from(value).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;

    use super::*;

    #[test]
    fn percent_truncates() {
        assert_eq!(percent(0, 3), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn percent_handles_empty_and_overflow() {
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(12, 10), 100);
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());

        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn reporter_survives_dropped_receiver() {
        let (sender, receiver) = channel();
        let reporter = Reporter::new(sender);
        drop(receiver);

        reporter.message("still fine");
        reporter.progress(1, 2);
    }

    #[test]
    fn reporter_from_fn_sees_events_synchronously() {
        let cancel = CancelToken::new();
        let reporter = {
            let cancel = cancel.clone();
            Reporter::from_fn(move |event| {
                if event == RestoreEvent::Progress(50) {
                    cancel.cancel();
                }
            })
        };

        reporter.progress(1, 4);
        assert!(!cancel.is_cancelled());

        reporter.progress(2, 4);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn reporter_sends_in_order() {
        let (sender, receiver) = channel();
        let reporter = Reporter::new(sender);

        reporter.message("one");
        reporter.progress(1, 4);
        reporter.finished(RestoreOutcome::Cancelled);

        let events: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            events,
            vec![
                RestoreEvent::Message("one".into()),
                RestoreEvent::Progress(25),
                RestoreEvent::Finished(RestoreOutcome::Cancelled),
            ]
        );
    }
}
