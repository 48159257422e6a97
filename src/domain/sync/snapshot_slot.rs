use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Tag handed out when a request is issued; later requests carry larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceToken(u64);

impl SequenceToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct SlotInner<T> {
    /// Token of the response currently published; 0 for the initial value.
    applied: u64,
    value: Arc<T>,
}

/// Single-writer, multi-reader slot holding the latest published value.
///
/// Values are replaced wholesale. A value is only published if its token is newer than
/// the one currently held, so a slow response can never overwrite the result of a
/// request issued after it.
#[derive(Debug)]
pub struct SnapshotSlot<T> {
    next_token: AtomicU64,
    inner: RwLock<SlotInner<T>>,
}

impl<T> SnapshotSlot<T> {
    pub fn new(initial: T) -> Self {
        Self { next_token: AtomicU64::new(1), inner: RwLock::new(SlotInner { applied: 0, value: Arc::new(initial) }) }
    }

    /// Tags a new request.
    pub fn issue(&self) -> SequenceToken {
        SequenceToken(self.next_token.fetch_add(1, Ordering::SeqCst))
    }

    /// Publishes `value` if `token` is newer than the published one. Returns whether it was applied.
    pub fn publish(&self, token: SequenceToken, value: T) -> bool {
        self.publish_with(token, |_| value).is_some()
    }

    /// Like [`SnapshotSlot::publish`], but builds the value from the currently published one
    /// while holding the write lock.
    pub fn publish_with(&self, token: SequenceToken, build: impl FnOnce(&T) -> T) -> Option<Arc<T>> {
        let mut guard = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());

        if token.0 <= guard.applied {
            log::debug!("Discarding superseded response (token {} <= published {}).", token.0, guard.applied);
            return None;
        }

        let next = Arc::new(build(&guard.value));
        guard.value = next.clone();
        guard.applied = token.0;
        Some(next)
    }

    pub fn load(&self) -> Arc<T> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner()).value.clone()
    }

    /// Token of the published value; 0 before the first publication.
    pub fn applied_token(&self) -> u64 {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner()).applied
    }
}
