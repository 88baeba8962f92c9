//! Backend with scripted write failures for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};

use super::{KeyValueBackend, MemoryBackend};

/// Memory backend whose writes to one key fail while failures remain.
///
/// Uses the default sequential `set_many`, so a multi-key write can stop
/// after some keys have already changed.
pub(crate) struct FlakyBackend {
    pub inner: MemoryBackend,
    failing_key: &'static str,
    failures: AtomicUsize,
}

impl FlakyBackend {
    pub fn failing_on(key: &'static str) -> Self {
        Self {
            inner: MemoryBackend::new(),
            failing_key: key,
            failures: AtomicUsize::new(0),
        }
    }

    /// Fail the next `n` writes to the failing key
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }
}

impl KeyValueBackend for FlakyBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if key == self.failing_key {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(anyhow!("keychain locked"));
            }
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}
