//! Identifier sources for shot events and sessions.
//!
//! Ids only need to be collision resistant. Production code uses random v4
//! UUIDs; tests inject [`SequentialIds`] to get predictable values.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Supplies fresh identifiers
pub trait IdSource: Debug + Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Random v4 UUIDs
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Monotonic ids `1, 2, 3, ...` encoded as UUIDs
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting at `first`
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.saturating_sub(1)),
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(n as u128)
    }
}

/// Shared handle used by the classifier and aggregator
pub type SharedIds = Arc<dyn IdSource>;

/// The default id source
pub fn random_ids() -> SharedIds {
    Arc::new(RandomIds)
}
