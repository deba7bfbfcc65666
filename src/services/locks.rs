use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes course resolution per teacher.
///
/// Holding a teacher's guard while a transaction commits guarantees the next
/// resolution for that teacher sees the course rows the first one created.
#[derive(Default)]
pub struct TeacherLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl TeacherLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks every named teacher. Names are expected upper-cased.
    ///
    /// Guards are taken in sorted order so two callers with overlapping sets
    /// cannot deadlock.
    pub async fn lock_all<I>(&self, teacher_names: I) -> Vec<OwnedMutexGuard<()>>
    where
        I: IntoIterator<Item = String>,
    {
        let names: BTreeSet<String> = teacher_names.into_iter().collect();
        let mut guards = Vec::with_capacity(names.len());
        for name in names {
            let lock = self.entry(name);
            guards.push(lock.lock_owned().await);
        }
        guards
    }

    fn entry(&self, name: String) -> Arc<AsyncMutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Entries nobody holds or waits on are dropped here so the map only
        // tracks teachers with saves in flight.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(name).or_default().clone()
    }
}
