//! Advisory progress counter for in-flight transfers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic count of cells that have finished transferring, safely
/// incrementable from concurrent transfer tasks.
///
/// Purely observational: overall success is always decided from the
/// per-cell outcome list, never from this counter.
#[derive(Clone, Default)]
pub struct TransferStatus {
    completed: Arc<AtomicU64>,
}

impl TransferStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more completed cell.
    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time read.
    pub fn get(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}
