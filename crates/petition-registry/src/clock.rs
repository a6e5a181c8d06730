//! Height sources.
//!
//! The registry measures deadlines and timestamps in block heights. A
//! [`Clock`] supplies the current height; the registry itself enforces that
//! readings never go backwards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use petition_registry_core::BlockHeight;

/// Supplies the current block height.
pub trait Clock: Send + Sync {
    fn now(&self) -> BlockHeight;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> BlockHeight {
        (**self).now()
    }
}

/// Wall-clock heights: seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> BlockHeight {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    height: AtomicU64,
}

impl ManualClock {
    pub fn new(height: BlockHeight) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    pub fn set(&self, height: BlockHeight) {
        self.height.store(height, Ordering::SeqCst);
    }

    /// Move forward by `blocks`, returning the new height.
    pub fn advance(&self, blocks: u64) -> BlockHeight {
        self.height.fetch_add(blocks, Ordering::SeqCst) + blocks
    }
}

impl Clock for ManualClock {
    fn now(&self) -> BlockHeight {
        self.height.load(Ordering::SeqCst)
    }
}
