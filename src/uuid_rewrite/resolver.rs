use std::collections::HashMap;

use uuid::Uuid;

use super::cache::RecencyCache;
use super::store::MappingStore;

/// Which uuid space a rewrite translates into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewriteDirection {
    OfflineToOnline,
    OnlineToOffline,
}

impl RewriteDirection {
    /// Server to client traffic.
    pub const S2C: RewriteDirection = RewriteDirection::OfflineToOnline;
    /// Client to server traffic.
    pub const C2S: RewriteDirection = RewriteDirection::OnlineToOffline;
}

/// Offline (backend) uuid <-> online (client) uuid.
pub trait UuidResolver {
    fn to_online(&self, offline_uuid: Uuid) -> Option<Uuid>;

    fn to_offline(&self, online_uuid: Uuid) -> Option<Uuid>;

    fn rewrite(&self, uuid: Uuid, direction: RewriteDirection) -> Option<Uuid> {
        match direction {
            RewriteDirection::OfflineToOnline => self.to_online(uuid),
            RewriteDirection::OnlineToOffline => self.to_offline(uuid),
        }
    }
}

/// Bijective view over the players connected right now.
pub struct LiveRegistryResolver {
    offline_to_online: HashMap<Uuid, Uuid>,
    online_to_offline: HashMap<Uuid, Uuid>,
}

impl LiveRegistryResolver {
    pub fn new(pairs: &[(Uuid, Uuid)]) -> LiveRegistryResolver {
        let mut offline_to_online = HashMap::with_capacity(pairs.len());
        let mut online_to_offline = HashMap::with_capacity(pairs.len());
        for (offline_uuid, online_uuid) in pairs {
            offline_to_online.insert(*offline_uuid, *online_uuid);
            online_to_offline.insert(*online_uuid, *offline_uuid);
        }
        LiveRegistryResolver {
            offline_to_online,
            online_to_offline,
        }
    }
}

impl UuidResolver for LiveRegistryResolver {
    fn to_online(&self, offline_uuid: Uuid) -> Option<Uuid> {
        self.offline_to_online.get(&offline_uuid).copied()
    }

    fn to_offline(&self, online_uuid: Uuid) -> Option<Uuid> {
        self.online_to_offline.get(&online_uuid).copied()
    }
}

pub struct RecencyCacheResolver<'a> {
    cache: &'a RecencyCache,
    live: Vec<(Uuid, Uuid)>,
}

impl<'a> RecencyCacheResolver<'a> {
    pub fn new(cache: &'a RecencyCache, live: Vec<(Uuid, Uuid)>) -> Self {
        RecencyCacheResolver { cache, live }
    }
}

impl UuidResolver for RecencyCacheResolver<'_> {
    fn to_online(&self, offline_uuid: Uuid) -> Option<Uuid> {
        self.cache.resolve_online(&self.live, offline_uuid)
    }

    fn to_offline(&self, online_uuid: Uuid) -> Option<Uuid> {
        self.cache.resolve_offline(&self.live, online_uuid)
    }
}

pub struct StoreResolver<'a> {
    store: &'a MappingStore,
}

impl<'a> StoreResolver<'a> {
    pub fn new(store: &'a MappingStore) -> Self {
        StoreResolver { store }
    }
}

impl UuidResolver for StoreResolver<'_> {
    fn to_online(&self, offline_uuid: Uuid) -> Option<Uuid> {
        self.store.lookup_online(offline_uuid)
    }

    fn to_offline(&self, online_uuid: Uuid) -> Option<Uuid> {
        self.store.lookup_offline(online_uuid)
    }
}

/// Asks each strategy in order, first hit wins.
pub struct ChainedResolver<'a> {
    strategies: Vec<Box<dyn UuidResolver + 'a>>,
}

impl<'a> ChainedResolver<'a> {
    pub fn new(strategies: Vec<Box<dyn UuidResolver + 'a>>) -> Self {
        ChainedResolver { strategies }
    }
}

impl UuidResolver for ChainedResolver<'_> {
    fn to_online(&self, offline_uuid: Uuid) -> Option<Uuid> {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.to_online(offline_uuid))
    }

    fn to_offline(&self, online_uuid: Uuid) -> Option<Uuid> {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.to_offline(online_uuid))
    }
}
