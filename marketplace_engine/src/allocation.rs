//! The batch allocation algorithm.
//!
//! Given a requested quantity for a product, walk the product's batches in creation order (oldest first) and deduct
//! quantity batch by batch, producing a per-batch consumption plan. Selling the oldest lot first is a business
//! policy for perishable stock and must not be replaced with another ordering (e.g. by expiry date).
//!
//! The algorithm is pure. It never mutates batch state; the fulfillment transaction is responsible for applying the
//! plan, and must discard the plan entirely when `fully_allocated` is false.
use crate::db_types::Batch;

/// One entry of a consumption plan: draw `quantity` units from the batch with id `batch_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDraw {
    pub batch_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone)]
pub struct AllocationPlan {
    /// Per-batch draws, in the order the batches were consumed (oldest first).
    pub draws: Vec<BatchDraw>,
    /// False when the batches were exhausted before the requested quantity was satisfied. Callers must treat this
    /// as a hard failure for the line item and commit nothing.
    pub fully_allocated: bool,
}

impl AllocationPlan {
    pub fn total_drawn(&self) -> i64 {
        self.draws.iter().map(|d| d.quantity).sum()
    }
}

/// Produce a consumption plan for `requested` units from `batches`.
///
/// `batches` must be pre-filtered to active, non-deleted, positive-remaining batches and pre-ordered oldest-created
/// first (ties broken by ascending id). The SQLite backend guarantees this in
/// [`fetch_active_batches_fifo`](crate::SqliteDatabase).
pub fn allocate(batches: &[Batch], requested: i64) -> AllocationPlan {
    let mut still_needed = requested.max(0);
    let mut draws = Vec::new();
    for batch in batches {
        if still_needed == 0 {
            break;
        }
        let drawn = batch.remaining.min(still_needed);
        if drawn > 0 {
            draws.push(BatchDraw { batch_id: batch.id, quantity: drawn });
            still_needed -= drawn;
        }
    }
    AllocationPlan { draws, fully_allocated: still_needed == 0 }
}
