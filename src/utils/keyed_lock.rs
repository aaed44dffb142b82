use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

const CLEANUP_THRESHOLD: i32 = 32;

/// One async mutex per string key. Locks for idle keys are dropped every few acquisitions.
pub struct KeyedLock {
    cumulative_cleanup: AtomicI32,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self {
            cumulative_cleanup: AtomicI32::new(0),
            locks: DashMap::new(),
        }
    }

    /// Waits for exclusive access to `id`. Access is held until the guard is dropped.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        self.cumulate_cleanup();

        let lock = self
            .locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    pub fn cleanup(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        self.cumulative_cleanup.store(0, Ordering::SeqCst);
    }

    fn cumulate_cleanup(&self) {
        let target = self.cumulative_cleanup.fetch_add(1, Ordering::SeqCst) + 1;
        if target >= CLEANUP_THRESHOLD {
            self.cleanup();
        }
    }
}

impl Default for KeyedLock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::KeyedLock;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLock::new());
        let guard = locks.lock("a").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("a").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyedLock::new();
        let _a = locks.lock("a").await;
        let _b = tokio::time::timeout(Duration::from_secs(1), locks.lock("b"))
            .await
            .unwrap();
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_keys() {
        let locks = KeyedLock::new();
        let held = locks.lock("held").await;
        drop(locks.lock("idle").await);

        locks.cleanup();
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.cleanup();
        assert!(locks.is_empty());
    }
}
