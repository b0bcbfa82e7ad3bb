use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::protocol::{PacketKind, ProtocolVersion, RewritablePacket};

// Offline-mode servers hash the name without a namespace and then stamp v3.
pub fn offline_player_uuid(name: &str) -> Uuid {
    let mut hash: [u8; 16] = md5::compute(format!("OfflinePlayer:{name}")).into();
    hash[6] = hash[6] & 0x0f | 0x30;
    hash[8] = hash[8] & 0x3f | 0x80;
    Uuid::from_bytes(hash)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerIdentity {
    /// What the client authenticated as.
    pub online_uuid: Uuid,
    /// What every backend derives from the name.
    pub offline_uuid: Uuid,
    pub name: String,
}

impl PlayerIdentity {
    pub fn new(online_uuid: Uuid, name: impl Into<String>) -> Self {
        let name = name.into();
        PlayerIdentity {
            online_uuid,
            offline_uuid: offline_player_uuid(&name),
            name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundPacket {
    pub kind: PacketKind,
    pub payload: Vec<u8>,
}

#[derive(Debug)]
pub struct ConnectedPlayer {
    identity: PlayerIdentity,
    protocol_version: ProtocolVersion,
    current_server: RwLock<Option<String>>,
    outbound: UnboundedSender<OutboundPacket>,
}

impl ConnectedPlayer {
    pub fn new(
        identity: PlayerIdentity,
        protocol_version: ProtocolVersion,
        outbound: UnboundedSender<OutboundPacket>,
    ) -> ConnectedPlayer {
        ConnectedPlayer {
            identity,
            protocol_version,
            current_server: RwLock::new(None),
            outbound,
        }
    }

    pub fn identity(&self) -> &PlayerIdentity {
        &self.identity
    }

    pub fn username(&self) -> &str {
        &self.identity.name
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    pub fn current_server(&self) -> Option<String> {
        self.current_server.read().clone()
    }

    pub fn set_current_server(&self, server: Option<String>) {
        *self.current_server.write() = server;
    }

    /// Queues a packet for this client. A closed connection only gets logged.
    pub fn send(&self, packet: &RewritablePacket) {
        let payload = match packet.encode() {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("Failed to encode {:?} for {}: {}", packet.kind(), self.username(), err);
                return;
            }
        };
        let outbound = OutboundPacket {
            kind: packet.kind(),
            payload,
        };
        if self.outbound.send(outbound).is_err() {
            log::debug!("Dropped {:?} for {}, connection closed", packet.kind(), self.username());
        }
    }
}

/// Read side of the live connection registry.
pub trait PlayerRegistry {
    /// Point-in-time snapshot, safe against concurrent connects and disconnects.
    fn all_players(&self) -> Vec<Arc<ConnectedPlayer>>;

    fn players_on(&self, server: &str) -> Vec<Arc<ConnectedPlayer>> {
        self.all_players()
            .into_iter()
            .filter(|player| player.current_server().as_deref() == Some(server))
            .collect()
    }
}

#[derive(Default)]
pub struct PlayerList {
    players: RwLock<HashMap<Uuid, Arc<ConnectedPlayer>>>,
}

impl PlayerList {
    pub fn new() -> PlayerList {
        PlayerList::default()
    }

    pub fn register(&self, player: Arc<ConnectedPlayer>) {
        self.players
            .write()
            .insert(player.identity().online_uuid, player);
    }

    pub fn unregister(&self, online_uuid: &Uuid) -> Option<Arc<ConnectedPlayer>> {
        self.players.write().remove(online_uuid)
    }

    pub fn current_players(&self) -> usize {
        self.players.read().len()
    }
}

impl PlayerRegistry for PlayerList {
    fn all_players(&self) -> Vec<Arc<ConnectedPlayer>> {
        self.players.read().values().cloned().collect()
    }
}
