use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter deciding whether a late asynchronous result may still be applied.
///
/// Starting new work with [`Generations::begin`] supersedes every earlier
/// ticket, and [`Generations::invalidate`] retires all outstanding tickets
/// when the owner goes away.
#[derive(Debug, Clone, Default)]
pub struct Generations {
    current: Arc<AtomicU64>,
}

#[derive(Debug, Clone)]
pub struct Generation {
    value: u64,
    current: Arc<AtomicU64>,
}

impl Generations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Generation {
        let value = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        Generation {
            value,
            current: Arc::clone(&self.current),
        }
    }

    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

impl Generation {
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.value
    }

    /// Runs `apply` only while this ticket is current.
    pub fn apply_if_current<R>(&self, apply: impl FnOnce() -> R) -> Option<R> {
        if self.is_current() {
            Some(apply())
        } else {
            None
        }
    }
}
