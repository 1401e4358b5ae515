//! The Cycle Budget (§4.B): a single monotonic counter shared across both
//! passes, plus cooperative cancellation (§4.F, §5).
//!
//! Every entry into the analyzer and every entry into the rewriter ticks the
//! same counter, so a graph pathological in either pass alone is still
//! bounded in total work. Cancellation is checked at the same point and
//! surfaces as the same error kind family with a distinct cause.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::InlineError;

/// A cheap, clonable cancellation handle. Checked at every budget tick;
/// observed at the next check rather than interrupting in-flight work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Monotonic visit counter bounding total analyzer + rewriter node entries.
pub struct CycleBudget {
    count: u64,
    limit: u64,
    cancellation: CancellationToken,
}

impl CycleBudget {
    pub fn new(limit: u64, cancellation: CancellationToken) -> Self {
        Self {
            count: 0,
            limit,
            cancellation,
        }
    }

    /// Record one analyzer-or-rewriter node entry. Checks cancellation
    /// first, then increments and compares against the ceiling.
    pub fn tick(&mut self) -> Result<(), InlineError> {
        if self.cancellation.is_cancelled() {
            return Err(InlineError::Cancelled {
                cause: "cancellation token observed at budget check".to_string(),
            });
        }
        self.count += 1;
        if self.count > self.limit {
            return Err(InlineError::CycleBudgetExceeded { limit: self.limit });
        }
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}
