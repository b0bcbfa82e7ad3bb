use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::cache::RecencyCache;
use super::resolver::{
    ChainedResolver, LiveRegistryResolver, RecencyCacheResolver, RewriteDirection,
    StoreResolver, UuidResolver,
};
use super::store::MappingStore;
use crate::cfg::UuidRewriteConfig;
use crate::player::{ConnectedPlayer, PlayerRegistry};
use crate::protocol::entity::EntityUuidPacket;
use crate::protocol::tab_list::PlayerInfoEntry;
use crate::protocol::{self, PacketKind, ProtocolVersion, RewritablePacket};
use crate::ProxyInfo;

/// Process-wide rewrite state, created with the proxy and torn down with it.
pub struct UuidRewriter {
    cache: RecencyCache,
    store: Arc<MappingStore>,
    maintenance: Mutex<Option<JoinHandle<()>>>,
}

impl UuidRewriter {
    pub fn new(config: &UuidRewriteConfig) -> UuidRewriter {
        UuidRewriter {
            cache: RecencyCache::new(config.cache_capacity, config.retire_grace()),
            store: Arc::new(MappingStore::new(config)),
            maintenance: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &RecencyCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<MappingStore> {
        &self.store
    }

    pub(crate) fn set_maintenance(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.maintenance.lock().replace(handle) {
            previous.abort();
        }
    }

    pub(crate) fn stop_maintenance(&self) {
        if let Some(handle) = self.maintenance.lock().take() {
            handle.abort();
        }
    }

    /// Live registry, then the recency cache, then the store. The cache is
    /// refreshed with every live pair up front, so players answered by the
    /// live tier are still cached once they leave.
    pub fn resolver(&self, players: &dyn PlayerRegistry) -> ChainedResolver<'_> {
        let live: Vec<(Uuid, Uuid)> = players
            .all_players()
            .iter()
            .map(|player| (player.identity().offline_uuid, player.identity().online_uuid))
            .collect();
        self.cache.refresh(&live);
        ChainedResolver::new(vec![
            Box::new(LiveRegistryResolver::new(&live)),
            Box::new(RecencyCacheResolver::new(&self.cache, live)),
            Box::new(StoreResolver::new(&self.store)),
        ])
    }
}

fn rewrite_uuid(resolver: &dyn UuidResolver, uuid: &mut Uuid, direction: RewriteDirection) -> bool {
    match resolver.rewrite(*uuid, direction) {
        Some(rewritten) if rewritten != *uuid => {
            log::trace!("Rewrote {} to {} ({:?})", uuid, rewritten, direction);
            *uuid = rewritten;
            true
        }
        _ => false,
    }
}

fn rewrite_entity(
    resolver: &dyn UuidResolver,
    packet: &mut dyn EntityUuidPacket,
    direction: RewriteDirection,
) -> bool {
    if !packet.is_player() {
        return false;
    }
    let mut uuid = packet.entity_uuid();
    if rewrite_uuid(resolver, &mut uuid, direction) {
        packet.set_entity_uuid(uuid);
        true
    } else {
        false
    }
}

fn rewrite_entries(
    resolver: &dyn UuidResolver,
    entries: &mut [PlayerInfoEntry],
    direction: RewriteDirection,
) -> bool {
    let mut changed = false;
    for entry in entries {
        changed |= rewrite_uuid(resolver, &mut entry.profile_id, direction);
    }
    changed
}

fn rewrite(
    proxy: &ProxyInfo,
    packet: &mut RewritablePacket,
    connection_player: &ConnectedPlayer,
    direction: RewriteDirection,
) -> bool {
    if !proxy.config.is_uuid_rewrite_active() {
        return false;
    }
    let resolver = proxy.uuid_rewriter.resolver(&proxy.players);
    let changed = match packet {
        RewritablePacket::SpawnEntity(packet) => rewrite_entity(&resolver, packet, direction),
        RewritablePacket::SpawnPlayer(packet) => rewrite_entity(&resolver, packet, direction),
        RewritablePacket::SpectatorTeleport(packet) => {
            rewrite_entity(&resolver, packet, direction)
        }
        RewritablePacket::UpsertPlayerInfo(packet) => {
            rewrite_entries(&resolver, &mut packet.entries, direction)
        }
        RewritablePacket::LegacyPlayerListItem(packet) => {
            rewrite_entries(&resolver, &mut packet.items, direction)
        }
        // the same removal fans out to every client on the backend, so the
        // cache keeps its entries; the disconnect hook retires them
        RewritablePacket::RemovePlayerInfo(packet) => {
            let mut changed = false;
            for profile in &mut packet.profiles {
                changed |= rewrite_uuid(&resolver, profile, direction);
            }
            changed
        }
    };
    if changed {
        log::debug!(
            "Rewrote uuids in {:?} for {}",
            packet.kind(),
            connection_player.username()
        );
    }
    changed
}

/// Backend to client: offline uuids become online ones.
pub fn rewrite_outbound(
    proxy: &ProxyInfo,
    packet: &mut RewritablePacket,
    connection_player: &ConnectedPlayer,
) -> bool {
    rewrite(proxy, packet, connection_player, RewriteDirection::S2C)
}

/// Client to backend: online uuids become offline ones.
pub fn rewrite_inbound(
    proxy: &ProxyInfo,
    packet: &mut RewritablePacket,
    connection_player: &ConnectedPlayer,
) -> bool {
    rewrite(proxy, packet, connection_player, RewriteDirection::C2S)
}

/// Decodes, rewrites and re-encodes one payload. `Ok(None)` means the
/// original bytes are already correct.
pub fn rewrite_payload(
    proxy: &ProxyInfo,
    kind: PacketKind,
    payload: &[u8],
    version: ProtocolVersion,
    connection_player: &ConnectedPlayer,
    direction: RewriteDirection,
) -> protocol::Result<Option<Vec<u8>>> {
    if !proxy.config.is_uuid_rewrite_active() {
        return Ok(None);
    }
    let mut packet = RewritablePacket::decode(kind, payload, version)?;
    if rewrite(proxy, &mut packet, connection_player, direction) {
        Ok(Some(packet.encode()?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{PlayerInfoForwarding, UmbrellaConfig};
    use crate::player::PlayerIdentity;
    use crate::protocol::entity::{SpawnEntity, SpectatorTeleport};
    use crate::protocol::io::WriteExt;
    use crate::protocol::tab_list::{RemovePlayerInfo, UpsertPlayerInfo};
    use log::LevelFilter;
    use tokio::sync::mpsc;

    fn proxy(online_mode: bool) -> ProxyInfo {
        let mut config = UmbrellaConfig {
            log_level: LevelFilter::Off,
            online_mode,
            player_info_forwarding: PlayerInfoForwarding::None,
            uuid_rewrite: UuidRewriteConfig::default(),
        };
        config.uuid_rewrite.enabled = true;
        ProxyInfo::new(config)
    }

    fn connect(proxy: &ProxyInfo, online: u128, name: &str) -> Arc<ConnectedPlayer> {
        let (tx, _rx) = mpsc::unbounded_channel();
        let player = Arc::new(ConnectedPlayer::new(
            PlayerIdentity::new(Uuid::from_u128(online), name),
            ProtocolVersion::MINECRAFT_1_21_4,
            tx,
        ));
        proxy.players.register(player.clone());
        player
    }

    fn spawn_player_entity(uuid: Uuid, entity_type: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_varint(12).unwrap();
        buf.write_uuid(uuid).unwrap();
        buf.write_varint(entity_type).unwrap();
        buf.extend_from_slice(&[0; 34]);
        buf
    }

    #[test]
    fn spawn_and_spectate_cross_the_proxy_in_opposite_directions() {
        let proxy = proxy(true);
        let steve = connect(&proxy, 1, "steve");
        let viewer = connect(&proxy, 2, "viewer");
        let offline = steve.identity().offline_uuid;

        let bytes = spawn_player_entity(offline, 147);
        let rewritten = rewrite_payload(
            &proxy,
            PacketKind::SpawnEntity,
            &bytes,
            viewer.protocol_version(),
            &viewer,
            RewriteDirection::S2C,
        )
        .unwrap()
        .unwrap();
        let packet = SpawnEntity::decode(&rewritten, viewer.protocol_version()).unwrap();
        assert_eq!(packet.entity_uuid, Uuid::from_u128(1));
        assert_eq!(rewritten.len(), bytes.len());

        let mut spectate = RewritablePacket::SpectatorTeleport(SpectatorTeleport {
            target_uuid: Uuid::from_u128(1),
            remainder: Vec::new(),
        });
        assert!(rewrite_inbound(&proxy, &mut spectate, &viewer));
        match spectate {
            RewritablePacket::SpectatorTeleport(packet) => assert_eq!(packet.target_uuid, offline),
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[test]
    fn live_hits_still_populate_the_cache() {
        let proxy = proxy(true);
        let steve = connect(&proxy, 1, "steve");
        let offline = steve.identity().offline_uuid;
        assert!(proxy.uuid_rewriter.cache().is_empty());

        let resolver = proxy.uuid_rewriter.resolver(&proxy.players);
        assert_eq!(resolver.to_online(offline), Some(Uuid::from_u128(1)));
        assert_eq!(proxy.uuid_rewriter.cache().len(), 1);

        // gone from the registry without a disconnect hook, the cache still answers
        proxy.players.unregister(&Uuid::from_u128(1));
        let resolver = proxy.uuid_rewriter.resolver(&proxy.players);
        assert_eq!(resolver.to_online(offline), Some(Uuid::from_u128(1)));
        assert_eq!(resolver.to_offline(Uuid::from_u128(1)), Some(offline));
    }

    #[test]
    fn non_player_entities_are_left_alone() {
        let proxy = proxy(true);
        let steve = connect(&proxy, 1, "steve");
        let bytes = spawn_player_entity(steve.identity().offline_uuid, 3);
        let result = rewrite_payload(
            &proxy,
            PacketKind::SpawnEntity,
            &bytes,
            steve.protocol_version(),
            &steve,
            RewriteDirection::S2C,
        )
        .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn already_online_uuid_is_a_no_op() {
        let proxy = proxy(true);
        let steve = connect(&proxy, 1, "steve");
        let bytes = spawn_player_entity(Uuid::from_u128(1), 147);
        let result = rewrite_payload(
            &proxy,
            PacketKind::SpawnEntity,
            &bytes,
            steve.protocol_version(),
            &steve,
            RewriteDirection::S2C,
        )
        .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn inactive_rewrite_touches_nothing() {
        let proxy = proxy(false);
        let steve = connect(&proxy, 1, "steve");
        let mut packet = RewritablePacket::RemovePlayerInfo(RemovePlayerInfo::new(vec![
            steve.identity().offline_uuid,
        ]));
        let before = packet.clone();
        assert!(!rewrite_outbound(&proxy, &mut packet, &steve));
        assert_eq!(packet, before);

        // not even decoded, so unsupported versions pass through too
        let bytes = spawn_player_entity(steve.identity().offline_uuid, 147);
        let result = rewrite_payload(
            &proxy,
            PacketKind::SpawnEntity,
            &bytes,
            ProtocolVersion(340),
            &steve,
            RewriteDirection::S2C,
        );
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn unknown_uuids_are_kept() {
        let proxy = proxy(true);
        let steve = connect(&proxy, 1, "steve");
        let stranger = Uuid::from_u128(0xdead);
        let mut packet = RewritablePacket::UpsertPlayerInfo(UpsertPlayerInfo {
            actions: 0b0001_0000,
            entries: vec![
                PlayerInfoEntry {
                    profile_id: steve.identity().offline_uuid,
                    body: vec![0x05],
                },
                PlayerInfoEntry {
                    profile_id: stranger,
                    body: vec![0x06],
                },
            ],
            remainder: Vec::new(),
        });
        assert!(rewrite_outbound(&proxy, &mut packet, &steve));
        match packet {
            RewritablePacket::UpsertPlayerInfo(packet) => {
                assert_eq!(packet.entries[0].profile_id, Uuid::from_u128(1));
                assert_eq!(packet.entries[0].body, vec![0x05]);
                assert_eq!(packet.entries[1].profile_id, stranger);
            }
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[test]
    fn unsupported_version_is_a_decode_error_when_active() {
        let proxy = proxy(true);
        let steve = connect(&proxy, 1, "steve");
        let bytes = spawn_player_entity(steve.identity().offline_uuid, 147);
        let result = rewrite_payload(
            &proxy,
            PacketKind::SpawnEntity,
            &bytes,
            ProtocolVersion(340),
            &steve,
            RewriteDirection::S2C,
        );
        assert!(matches!(
            result,
            Err(protocol::ProtocolError::UnsupportedVersion(_))
        ));
    }
}
