mod reference;

pub use reference::{generate, DEFAULT_BATCH_CODE_LENGTH, DEFAULT_ORDER_REFERENCE_LENGTH};
pub(crate) use reference::COLLISION_WARN_THRESHOLD;
