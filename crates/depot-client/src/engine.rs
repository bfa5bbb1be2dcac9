//! Concurrent cell transfer engine.
//!
//! Fans a batch of per-cell operations out over tokio tasks, bounded by
//! a shared semaphore, and fans their outcomes back in. Exactly one
//! outcome per input item; one cell's failure never cancels or delays
//! the others. The engine does not retry — the caller gets the failed
//! addresses and decides.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of one cell's transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub address: u64,
    pub succeeded: bool,
}

/// Runs `op` once per `(address, item)` with at most `max_in_flight`
/// operations running at once.
///
/// Outcomes arrive in completion order, not submission order. Items
/// beyond the in-flight bound queue on the semaphore and start as slots
/// free up, so no cell can block another's eventual attempt. A failed
/// operation is recorded as `succeeded = false` and logged, never
/// raised.
pub async fn transfer_all<T, E, F, Fut>(
    items: Vec<(u64, T)>,
    max_in_flight: usize,
    op: F,
) -> Vec<TransferOutcome>
where
    T: Send + 'static,
    E: std::fmt::Display + Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
{
    let limit = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut tasks: JoinSet<TransferOutcome> = JoinSet::new();

    for (address, item) in items {
        let limit = limit.clone();
        let op = op.clone();
        tasks.spawn(async move {
            // The semaphore is never closed.
            let _permit = match limit.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return TransferOutcome { address, succeeded: false },
            };
            match op(item).await {
                Ok(()) => TransferOutcome { address, succeeded: true },
                Err(err) => {
                    tracing::warn!(address, error = %err, "cell transfer failed");
                    TransferOutcome { address, succeeded: false }
                }
            }
        });
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => tracing::error!(error = %err, "transfer task aborted"),
        }
    }
    outcomes
}
