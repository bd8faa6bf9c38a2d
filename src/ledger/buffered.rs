//! Buffered ledger: bounded queue in front of a background writer.
//!
//! `record` is a `try_send` and never blocks the assignment path. When the
//! queue is full the event is dropped, the drop is counted and logged, and
//! the caller gets [`Error::Ingestion`](crate::Error::Ingestion) to swallow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::{Error, Result};

use super::{Event, EventSink};

/// Non-blocking front for a slower [`EventSink`].
///
/// A bounded channel decouples assignment-path writers from the sink; a
/// background task drains the channel and forwards each event. Saturation
/// sheds load instead of blocking: exposure logging is best-effort
/// relative to returning an assignment.
pub struct BufferedLedger {
    tx: mpsc::Sender<Event>,
    dropped: AtomicU64,
    writer: JoinHandle<()>,
}

impl BufferedLedger {
    /// Spawn the background writer onto the current tokio runtime.
    ///
    /// `capacity` bounds the number of in-flight events and must be
    /// non-zero; beyond it, `record` drops.
    #[must_use]
    pub fn spawn(sink: Arc<dyn EventSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Event>(capacity);
        let writer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(err) = sink.record(event) {
                    warn!(%err, "background writer failed to persist event");
                }
            }
        });
        Self {
            tx,
            dropped: AtomicU64::new(0),
            writer,
        }
    }

    /// Number of events dropped due to queue saturation so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting events and wait for the writer to drain the queue.
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.writer.await;
    }
}

impl EventSink for BufferedLedger {
    fn record(&self, event: Event) -> Result<()> {
        self.tx.try_send(event).map_err(|err| {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            let reason = match err {
                TrySendError::Full(_) => "event queue full",
                TrySendError::Closed(_) => "event writer stopped",
            };
            warn!(reason, "dropping event");
            Error::Ingestion(reason.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use chrono::Utc;

    #[tokio::test]
    async fn test_events_reach_the_sink() {
        let sink = Arc::new(MemoryLedger::new());
        let buffered = BufferedLedger::spawn(sink.clone(), 16);

        for i in 0..5 {
            buffered
                .record(Event::exposure(format!("user-{i}"), "exp-001", "control", Utc::now()))
                .unwrap();
        }

        buffered.close().await;
        assert_eq!(sink.len(), 5);
    }

    #[tokio::test]
    async fn test_saturation_drops_and_counts() {
        let sink = Arc::new(MemoryLedger::new());
        let buffered = BufferedLedger::spawn(sink.clone(), 2);

        // On a current-thread runtime the writer task is not polled while
        // this body runs, so the queue fills deterministically.
        let mut rejected = 0;
        for i in 0..5 {
            let event = Event::exposure(format!("user-{i}"), "exp-001", "control", Utc::now());
            if let Err(err) = buffered.record(event) {
                assert!(matches!(err, Error::Ingestion(_)));
                rejected += 1;
            }
        }

        assert_eq!(rejected, 3);
        assert_eq!(buffered.dropped(), 3);

        buffered.close().await;
        assert_eq!(sink.len(), 2);
    }
}
