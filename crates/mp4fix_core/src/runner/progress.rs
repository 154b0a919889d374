//! Progress counter and cancellation handle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Processed vs. discovered candidates for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    processed: usize,
    total: usize,
}

impl Progress {
    /// Nothing processed out of `total`.
    pub fn new(total: usize) -> Self {
        Self {
            processed: 0,
            total,
        }
    }

    /// Count one more processed candidate. Saturates at `total`.
    pub fn advance(&mut self) {
        if self.processed < self.total {
            self.processed += 1;
        }
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Whole percentage, rounded down.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            100
        } else {
            ((self.processed * 100) / self.total) as u32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed == self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.processed, self.total)
    }
}

/// Handle for stopping a run between candidates.
///
/// The file being remuxed when `cancel()` is called is allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
