use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use uuid::Uuid;

#[derive(Clone, Copy, Debug)]
struct CachedIdentity {
    online_uuid: Uuid,
    retired_at: Option<Instant>,
}

/// Offline to online pairs seen recently, kept past disconnect so removal
/// packets still in flight can be rewritten.
///
/// Every lookup first refreshes the cache from the live pairs and evicts
/// down to capacity, all under the one lock. Eviction is by capacity only
/// unless a retire grace is set.
pub struct RecencyCache {
    entries: Mutex<LruCache<Uuid, CachedIdentity>>,
    retire_grace: Option<Duration>,
}

impl RecencyCache {
    pub fn new(capacity: usize, retire_grace: Option<Duration>) -> RecencyCache {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        RecencyCache {
            entries: Mutex::new(LruCache::new(capacity)),
            retire_grace,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn refresh_locked(
        &self,
        entries: &mut LruCache<Uuid, CachedIdentity>,
        live: &[(Uuid, Uuid)],
        now: Instant,
    ) {
        if let Some(grace) = self.retire_grace {
            let expired: Vec<Uuid> = entries
                .iter()
                .filter(|(_, entry)| {
                    entry
                        .retired_at
                        .is_some_and(|at| now.saturating_duration_since(at) >= grace)
                })
                .map(|(offline_uuid, _)| *offline_uuid)
                .collect();
            for offline_uuid in expired {
                entries.pop(&offline_uuid);
            }
        }

        for (offline_uuid, online_uuid) in live {
            entries.put(
                *offline_uuid,
                CachedIdentity {
                    online_uuid: *online_uuid,
                    retired_at: None,
                },
            );
        }
    }

    /// `live` holds (offline, online) pairs of every connected player.
    pub fn refresh(&self, live: &[(Uuid, Uuid)]) {
        let mut entries = self.entries.lock();
        self.refresh_locked(&mut entries, live, Instant::now());
    }

    pub fn resolve_online(&self, live: &[(Uuid, Uuid)], offline_uuid: Uuid) -> Option<Uuid> {
        self.resolve_online_at(live, offline_uuid, Instant::now())
    }

    pub fn resolve_offline(&self, live: &[(Uuid, Uuid)], online_uuid: Uuid) -> Option<Uuid> {
        self.resolve_offline_at(live, online_uuid, Instant::now())
    }

    fn resolve_online_at(
        &self,
        live: &[(Uuid, Uuid)],
        offline_uuid: Uuid,
        now: Instant,
    ) -> Option<Uuid> {
        let mut entries = self.entries.lock();
        self.refresh_locked(&mut entries, live, now);
        entries.get(&offline_uuid).map(|entry| entry.online_uuid)
    }

    fn resolve_offline_at(
        &self,
        live: &[(Uuid, Uuid)],
        online_uuid: Uuid,
        now: Instant,
    ) -> Option<Uuid> {
        let mut entries = self.entries.lock();
        self.refresh_locked(&mut entries, live, now);
        // most recently used first, so a reassigned name resolves to the newest pair
        let offline_uuid = entries
            .iter()
            .find(|(_, entry)| entry.online_uuid == online_uuid)
            .map(|(offline_uuid, _)| *offline_uuid)?;
        entries.get(&offline_uuid);
        Some(offline_uuid)
    }

    /// Marks a pair as belonging to a player who left. It keeps resolving
    /// until it is evicted, or until the grace period is over when one is set.
    pub fn retire(&self, offline_uuid: Uuid, online_uuid: Uuid) {
        self.retire_at(offline_uuid, online_uuid, Instant::now());
    }

    fn retire_at(&self, offline_uuid: Uuid, online_uuid: Uuid, now: Instant) {
        self.entries.lock().put(
            offline_uuid,
            CachedIdentity {
                online_uuid,
                retired_at: Some(now),
            },
        );
    }

    pub fn purge(&self, offline_uuid: &Uuid) -> bool {
        self.entries.lock().pop(offline_uuid).is_some()
    }
}
