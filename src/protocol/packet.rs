use super::entity::{SpawnEntity, SpawnPlayer, SpectatorTeleport};
use super::tab_list::{LegacyPlayerListItem, RemovePlayerInfo, UpsertPlayerInfo};
use super::{ProtocolVersion, Result};

/// Packet identity as resolved by the framing layer. Numeric ids move
/// between versions, so the pipeline hands over this tag instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PacketKind {
    SpawnEntity,
    SpawnPlayer,
    SpectatorTeleport,
    UpsertPlayerInfo,
    RemovePlayerInfo,
    LegacyPlayerListItem,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RewritablePacket {
    SpawnEntity(SpawnEntity),
    SpawnPlayer(SpawnPlayer),
    SpectatorTeleport(SpectatorTeleport),
    UpsertPlayerInfo(UpsertPlayerInfo),
    RemovePlayerInfo(RemovePlayerInfo),
    LegacyPlayerListItem(LegacyPlayerListItem),
}

impl RewritablePacket {
    pub fn decode(kind: PacketKind, payload: &[u8], version: ProtocolVersion) -> Result<Self> {
        Ok(match kind {
            PacketKind::SpawnEntity => Self::SpawnEntity(SpawnEntity::decode(payload, version)?),
            PacketKind::SpawnPlayer => Self::SpawnPlayer(SpawnPlayer::decode(payload, version)?),
            PacketKind::SpectatorTeleport => {
                Self::SpectatorTeleport(SpectatorTeleport::decode(payload, version)?)
            }
            PacketKind::UpsertPlayerInfo => {
                Self::UpsertPlayerInfo(UpsertPlayerInfo::decode(payload, version)?)
            }
            PacketKind::RemovePlayerInfo => {
                Self::RemovePlayerInfo(RemovePlayerInfo::decode(payload, version)?)
            }
            PacketKind::LegacyPlayerListItem => {
                Self::LegacyPlayerListItem(LegacyPlayerListItem::decode(payload, version)?)
            }
        })
    }

    pub fn encode(&self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::SpawnEntity(packet) => packet.encode(),
            Self::SpawnPlayer(packet) => packet.encode(),
            Self::SpectatorTeleport(packet) => packet.encode(),
            Self::UpsertPlayerInfo(packet) => packet.encode(),
            Self::RemovePlayerInfo(packet) => packet.encode(),
            Self::LegacyPlayerListItem(packet) => packet.encode(),
        }
    }

    pub fn kind(&self) -> PacketKind {
        match self {
            Self::SpawnEntity(_) => PacketKind::SpawnEntity,
            Self::SpawnPlayer(_) => PacketKind::SpawnPlayer,
            Self::SpectatorTeleport(_) => PacketKind::SpectatorTeleport,
            Self::UpsertPlayerInfo(_) => PacketKind::UpsertPlayerInfo,
            Self::RemovePlayerInfo(_) => PacketKind::RemovePlayerInfo,
            Self::LegacyPlayerListItem(_) => PacketKind::LegacyPlayerListItem,
        }
    }

    /// Tab list removal in the form the given client understands.
    pub fn tab_list_removal(version: ProtocolVersion, profiles: Vec<uuid::Uuid>) -> Self {
        if version.no_less_than(ProtocolVersion::MINECRAFT_1_19_3) {
            Self::RemovePlayerInfo(RemovePlayerInfo::new(profiles))
        } else {
            Self::LegacyPlayerListItem(LegacyPlayerListItem::remove(profiles))
        }
    }
}
