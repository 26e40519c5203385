use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use flowlens_core::FetchTicket;
use flowlens_core::RuntimeAction;

use crate::source::DatasetSource;

/// Runs a fetch to completion and folds the outcome into the action the
/// view expects. Errors never escape; they become `DatasetFailed`.
pub fn resolve_ticket<S: DatasetSource + ?Sized>(source: &S, ticket: FetchTicket) -> RuntimeAction {
    match source.fetch(&ticket.dataset_id) {
        Ok(records) => RuntimeAction::DatasetLoaded {
            ticket,
            records: records.into(),
        },
        Err(err) => {
            tracing::warn!(dataset = %ticket.dataset_id, seq = ticket.seq, "fetch failed: {err}");
            RuntimeAction::DatasetFailed {
                ticket,
                message: err.to_string(),
            }
        }
    }
}

/// Fetches on worker threads and reports results on a channel in
/// completion order. Ordering is left to the reducer's ticket check.
/// Every spawned fetch reports exactly once; a panicking source is
/// reported as `DatasetFailed`.
pub struct BackgroundFetcher<S> {
    source: Arc<S>,
    tx: mpsc::Sender<RuntimeAction>,
    rx: mpsc::Receiver<RuntimeAction>,
    in_flight: usize,
}

impl<S: DatasetSource + Send + Sync + 'static> BackgroundFetcher<S> {
    pub fn new(source: S) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source: Arc::new(source),
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn spawn(&mut self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let fallback = ticket.clone();
            let action = panic::catch_unwind(AssertUnwindSafe(|| resolve_ticket(&*source, ticket)))
                .unwrap_or_else(|_| {
                    tracing::error!(dataset = %fallback.dataset_id, seq = fallback.seq, "fetch worker panicked");
                    RuntimeAction::DatasetFailed {
                        ticket: fallback,
                        message: "fetch worker panicked".to_string(),
                    }
                });
            let _ = tx.send(action);
        });
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Results that have already arrived.
    pub fn drain(&mut self) -> Vec<RuntimeAction> {
        let results: Vec<RuntimeAction> = self.rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(results.len());
        results
    }

    /// Blocks until the next result, or returns `None` when nothing is in flight.
    pub fn recv(&mut self) -> Option<RuntimeAction> {
        if self.in_flight == 0 {
            return None;
        }
        let action = self.rx.recv().ok()?;
        self.in_flight -= 1;
        Some(action)
    }
}
