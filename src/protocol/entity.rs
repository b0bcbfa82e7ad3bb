//! Packets that name a single entity by uuid. Only the prefix up to the
//! identifying fields is decoded, everything after it is carried verbatim.

use std::io::Cursor;
use uuid::Uuid;

use super::io::{ReadExt, SkipExt, WriteExt};
use super::version_policy::player_entity_type;
use super::{ProtocolError, ProtocolVersion, Result};

pub trait EntityUuidPacket {
    fn is_player(&self) -> bool;
    fn entity_uuid(&self) -> Uuid;
    fn set_entity_uuid(&mut self, uuid: Uuid);
}

fn require(version: ProtocolVersion, since: ProtocolVersion) -> Result<()> {
    if version.less_than(since) {
        return Err(ProtocolError::UnsupportedVersion(version));
    }
    Ok(())
}

/// Generic entity spawn, which also spawns players since 1.20.2.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnEntity {
    pub entity_id: i32,
    pub entity_uuid: Uuid,
    pub entity_type: i32,
    pub remainder: Vec<u8>,
    is_player: bool,
}

impl SpawnEntity {
    pub fn decode(payload: &[u8], version: ProtocolVersion) -> Result<Self> {
        let player_type = player_entity_type(version)?;
        let mut cursor = Cursor::new(payload);
        let entity_id = cursor.read_varint()?;
        let entity_uuid = cursor.read_uuid()?;
        let entity_type = cursor.read_varint()?;
        Ok(SpawnEntity {
            entity_id,
            entity_uuid,
            entity_type,
            remainder: cursor.rest(),
            is_player: entity_type == player_type,
        })
    }

    pub fn encode(&self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.remainder.len() + 24);
        buf.write_varint(self.entity_id)?;
        buf.write_uuid(self.entity_uuid)?;
        buf.write_varint(self.entity_type)?;
        buf.extend_from_slice(&self.remainder);
        Ok(buf)
    }
}

impl EntityUuidPacket for SpawnEntity {
    fn is_player(&self) -> bool {
        self.is_player
    }

    fn entity_uuid(&self) -> Uuid {
        self.entity_uuid
    }

    fn set_entity_uuid(&mut self, uuid: Uuid) {
        self.entity_uuid = uuid;
    }
}

/// Dedicated player spawn, 1.8 up to 1.20.1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnPlayer {
    pub entity_id: i32,
    pub entity_uuid: Uuid,
    pub remainder: Vec<u8>,
}

impl SpawnPlayer {
    pub fn decode(payload: &[u8], version: ProtocolVersion) -> Result<Self> {
        require(version, ProtocolVersion::MINECRAFT_1_8)?;
        if version.no_less_than(ProtocolVersion::MINECRAFT_1_20_2) {
            return Err(ProtocolError::UnsupportedVersion(version));
        }
        let mut cursor = Cursor::new(payload);
        let entity_id = cursor.read_varint()?;
        let entity_uuid = cursor.read_uuid()?;
        Ok(SpawnPlayer {
            entity_id,
            entity_uuid,
            remainder: cursor.rest(),
        })
    }

    pub fn encode(&self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.remainder.len() + 20);
        buf.write_varint(self.entity_id)?;
        buf.write_uuid(self.entity_uuid)?;
        buf.extend_from_slice(&self.remainder);
        Ok(buf)
    }
}

impl EntityUuidPacket for SpawnPlayer {
    fn is_player(&self) -> bool {
        true
    }

    fn entity_uuid(&self) -> Uuid {
        self.entity_uuid
    }

    fn set_entity_uuid(&mut self, uuid: Uuid) {
        self.entity_uuid = uuid;
    }
}

/// Serverbound spectate request. The target is assumed to be a player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpectatorTeleport {
    pub target_uuid: Uuid,
    pub remainder: Vec<u8>,
}

impl SpectatorTeleport {
    pub fn decode(payload: &[u8], version: ProtocolVersion) -> Result<Self> {
        require(version, ProtocolVersion::MINECRAFT_1_8)?;
        let mut cursor = Cursor::new(payload);
        let target_uuid = cursor.read_uuid()?;
        Ok(SpectatorTeleport {
            target_uuid,
            remainder: cursor.rest(),
        })
    }

    pub fn encode(&self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.remainder.len() + 16);
        buf.write_uuid(self.target_uuid)?;
        buf.extend_from_slice(&self.remainder);
        Ok(buf)
    }
}

impl EntityUuidPacket for SpectatorTeleport {
    fn is_player(&self) -> bool {
        true
    }

    fn entity_uuid(&self) -> Uuid {
        self.target_uuid
    }

    fn set_entity_uuid(&mut self, uuid: Uuid) {
        self.target_uuid = uuid;
    }
}
