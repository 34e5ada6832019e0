//! Optional batched ingest front-end.
//!
//! A bounded queue plus one worker thread draining it into the synchronous
//! engine core. Batching here is pure amortization: every event still goes
//! through the same `on_*` entry, with identical semantics to calling the
//! engine directly. Producers never block; a full queue rejects the event
//! and the caller decides its resubmission policy.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use thiserror::Error;
use tracing::{debug, info, warn};

use bora_core::events::{Cancel, Order, Trade};

use crate::engine::RiskEngine;

/// Ingest adapter errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The queue is full; the event was not accepted.
    #[error("ingest queue full")]
    QueueFull,

    /// The adapter has been shut down.
    #[error("ingest adapter stopped")]
    Stopped,
}

/// Counters exposed by the ingest adapter.
#[derive(Debug, Default)]
pub struct IngestStats {
    /// Events accepted into the queue.
    pub accepted: AtomicU64,
    /// Events rejected because the queue was full.
    pub rejected: AtomicU64,
    /// Events drained and handed to the engine.
    pub processed: AtomicU64,
    /// Events the engine rejected as malformed.
    pub failed: AtomicU64,
}

enum IngestEvent {
    Order(Order),
    Trade(Trade),
    Cancel(Cancel),
}

/// Batched front-end over a shared [`RiskEngine`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use bora_core::events::{Direction, Order};
/// use bora_engine::{BatchIngest, EngineConfig, RiskEngine};
///
/// let engine = RiskEngine::new_shared(EngineConfig::new(), |_record| {});
/// let ingest = BatchIngest::spawn(Arc::clone(&engine), 1024, 64);
///
/// let order = Order::new(1, "ACC", "T2303", Direction::Bid, 100.0, 1, 0).unwrap();
/// ingest.submit_order(order).unwrap();
/// ingest.shutdown();
/// ```
pub struct BatchIngest {
    tx: Option<Sender<IngestEvent>>,
    worker: Option<JoinHandle<()>>,
    stats: Arc<IngestStats>,
}

impl BatchIngest {
    /// Starts the adapter with the given queue capacity and drain batch
    /// size (both clamped to at least 1).
    #[must_use]
    pub fn spawn(engine: Arc<RiskEngine>, queue_capacity: usize, batch_size: usize) -> Self {
        let (tx, rx) = bounded(queue_capacity.max(1));
        let stats = Arc::new(IngestStats::default());
        let worker_stats = Arc::clone(&stats);
        let batch = batch_size.max(1);
        info!(queue_capacity, batch_size = batch, "batch ingest started");
        let worker = std::thread::spawn(move || {
            Self::drain_loop(&engine, &rx, &worker_stats, batch);
        });
        Self {
            tx: Some(tx),
            worker: Some(worker),
            stats,
        }
    }

    /// Enqueues an order.
    pub fn submit_order(&self, order: Order) -> Result<(), IngestError> {
        self.submit(IngestEvent::Order(order))
    }

    /// Enqueues a trade.
    pub fn submit_trade(&self, trade: Trade) -> Result<(), IngestError> {
        self.submit(IngestEvent::Trade(trade))
    }

    /// Enqueues a cancel.
    pub fn submit_cancel(&self, cancel: Cancel) -> Result<(), IngestError> {
        self.submit(IngestEvent::Cancel(cancel))
    }

    /// Returns the adapter's counters.
    #[must_use]
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Stops the worker after the queue drains and waits for it to exit.
    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn submit(&self, event: IngestEvent) -> Result<(), IngestError> {
        let Some(tx) = &self.tx else {
            return Err(IngestError::Stopped);
        };
        match tx.try_send(event) {
            Ok(()) => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                warn!("ingest queue full; event rejected");
                Err(IngestError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(IngestError::Stopped),
        }
    }

    fn drain_loop(
        engine: &RiskEngine,
        rx: &Receiver<IngestEvent>,
        stats: &IngestStats,
        batch_size: usize,
    ) {
        // Block for the first event of each batch, then drain greedily up
        // to the batch size.
        while let Ok(first) = rx.recv() {
            Self::dispatch(engine, stats, first);
            for _ in 1..batch_size {
                match rx.try_recv() {
                    Ok(event) => Self::dispatch(engine, stats, event),
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                }
            }
        }
        debug!("batch ingest worker exiting");
    }

    fn dispatch(engine: &RiskEngine, stats: &IngestStats, event: IngestEvent) {
        let result = match event {
            IngestEvent::Order(order) => engine.on_order(&order),
            IngestEvent::Trade(trade) => engine.on_trade(&trade),
            IngestEvent::Cancel(cancel) => engine.on_cancel(&cancel),
        };
        stats.processed.fetch_add(1, Ordering::Relaxed);
        if let Err(error) = result {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            debug!(%error, "engine rejected queued event");
        }
    }

    fn stop_worker(&mut self) {
        // Dropping the sender disconnects the channel; the worker drains
        // what is left and exits.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for BatchIngest {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::rules::rate_limit::{RateLimitConfig, RateLimitRule};
    use bora_core::actions::ActionKind;
    use bora_core::events::Direction;
    use parking_lot::Mutex;

    const T0: u64 = 1_700_000_000_000_000_000;

    fn order(oid: u64, ts: u64) -> Order {
        Order::new(oid, "A", "T2303", Direction::Bid, 100.0, 1, ts).unwrap()
    }

    #[test]
    fn test_events_flow_through_to_engine() {
        let actions = Arc::new(Mutex::new(Vec::new()));
        let actions_clone = Arc::clone(&actions);
        let engine = RiskEngine::new_shared(EngineConfig::new(), move |record| {
            actions_clone.lock().push(record.action);
        });
        engine
            .add_rule(Arc::new(
                RateLimitRule::new(RateLimitConfig::new("RATE", 3, 1_000_000_000)).unwrap(),
            ))
            .unwrap();

        let ingest = BatchIngest::spawn(Arc::clone(&engine), 64, 16);
        for i in 0..5_u64 {
            ingest.submit_order(order(i, T0 + i * 1_000_000)).unwrap();
        }
        ingest.shutdown();

        assert_eq!(engine.diagnostics().orders_processed, 5);
        assert_eq!(actions.lock().clone(), vec![ActionKind::SuspendOrdering]);
    }

    #[test]
    fn test_queue_full_rejects() {
        use crate::rules::{Rule, RuleContext, RuleVerdict};

        // A rule that parks the worker on its first event, so the
        // capacity-1 queue is guaranteed to back up.
        struct StallRule(Arc<Mutex<()>>);
        impl Rule for StallRule {
            fn id(&self) -> &str {
                "STALL"
            }
            fn on_order(&self, _ctx: &RuleContext<'_>, _order: &Order) -> Option<RuleVerdict> {
                let _gate = self.0.lock();
                None
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }

        let gate = Arc::new(Mutex::new(()));
        let engine = RiskEngine::new_shared(EngineConfig::new(), |_record| {});
        engine.add_rule(Arc::new(StallRule(Arc::clone(&gate)))).unwrap();

        let held = gate.lock();
        let ingest = BatchIngest::spawn(Arc::clone(&engine), 1, 1);

        // First event is pulled by the worker and stalls on the gate, the
        // second fills the queue, the third must be rejected.
        ingest.submit_order(order(1, T0)).unwrap();
        let mut saw_full = false;
        for i in 2..100_u64 {
            if ingest.submit_order(order(i, T0)) == Err(IngestError::QueueFull) {
                saw_full = true;
                break;
            }
        }
        assert!(saw_full);
        assert!(ingest.stats().rejected.load(Ordering::Relaxed) >= 1);

        drop(held);
        ingest.shutdown();
    }

    #[test]
    fn test_drop_stops_worker() {
        let engine = RiskEngine::new_shared(EngineConfig::new(), |_record| {});
        let ingest = BatchIngest::spawn(Arc::clone(&engine), 8, 4);
        ingest.submit_order(order(1, T0)).unwrap();
        drop(ingest);
        // The worker drained the queue before exiting.
        assert_eq!(engine.diagnostics().orders_processed, 1);
    }
}
