//! Short, human-presentable reference codes for order groups and batches.
//!
//! The generator produces a fixed-length alphanumeric code from the thread-local random source. It does **not**
//! guarantee uniqueness; insertion sites probe the storage-level uniqueness constraint and regenerate on collision
//! (the generate-and-probe pattern). The retry loops have no hard upper bound, but log a warning when they spin
//! more than a handful of times, since that points at a shrinking code space or a bug.
use rand::{distributions::Alphanumeric, Rng};

pub const DEFAULT_ORDER_REFERENCE_LENGTH: usize = 10;
pub const DEFAULT_BATCH_CODE_LENGTH: usize = 8;

/// Number of collision retries after which the insertion loops start warning.
pub(crate) const COLLISION_WARN_THRESHOLD: u32 = 5;

/// Generate a random alphanumeric code of the given length.
pub fn generate(length: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(length).map(char::from).collect()
}
