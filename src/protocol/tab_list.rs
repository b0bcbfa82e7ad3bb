//! Tab list packets. Entries are split into the profile uuid and an opaque
//! body; the body layout is only walked far enough to find where the next
//! entry starts.

use std::io::Cursor;
use uuid::Uuid;

use super::io::{ReadExt, SkipExt, WriteExt};
use super::nbt::skip_network_tag;
use super::{ProtocolError, ProtocolVersion, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerInfoEntry {
    pub profile_id: Uuid,
    pub body: Vec<u8>,
}

impl PlayerInfoEntry {
    pub fn bare(profile_id: Uuid) -> Self {
        PlayerInfoEntry {
            profile_id,
            body: Vec::new(),
        }
    }
}

fn read_count(cursor: &mut Cursor<&[u8]>) -> Result<usize> {
    let count = cursor.read_varint()?;
    if count < 0 {
        return Err(ProtocolError::InvalidLength(count as i64));
    }
    Ok(count as usize)
}

fn read_entries<F>(cursor: &mut Cursor<&[u8]>, mut skip_body: F) -> Result<Vec<PlayerInfoEntry>>
where
    F: FnMut(&mut Cursor<&[u8]>) -> Result<()>,
{
    let count = read_count(cursor)?;
    let mut entries = Vec::new();
    for _ in 0..count {
        let profile_id = cursor.read_uuid()?;
        let start = cursor.position() as usize;
        skip_body(cursor)?;
        let end = cursor.position() as usize;
        entries.push(PlayerInfoEntry {
            profile_id,
            body: cursor.get_ref()[start..end].to_vec(),
        });
    }
    Ok(entries)
}

fn write_entries(buf: &mut Vec<u8>, entries: &[PlayerInfoEntry]) -> std::io::Result<()> {
    buf.write_varint(entries.len() as i32)?;
    for entry in entries {
        buf.write_uuid(entry.profile_id)?;
        buf.extend_from_slice(&entry.body);
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UpsertAction {
    AddPlayer,
    InitializeChat,
    UpdateGameMode,
    UpdateListed,
    UpdateLatency,
    UpdateDisplayName,
    UpdateListOrder,
    UpdateHat,
}

const UPSERT_ACTIONS: [UpsertAction; 8] = [
    UpsertAction::AddPlayer,
    UpsertAction::InitializeChat,
    UpsertAction::UpdateGameMode,
    UpsertAction::UpdateListed,
    UpsertAction::UpdateLatency,
    UpsertAction::UpdateDisplayName,
    UpsertAction::UpdateListOrder,
    UpsertAction::UpdateHat,
];

fn upsert_action_count(version: ProtocolVersion) -> usize {
    if version.no_less_than(ProtocolVersion::MINECRAFT_1_21_4) {
        8
    } else if version.no_less_than(ProtocolVersion::MINECRAFT_1_21_2) {
        7
    } else {
        6
    }
}

fn skip_upsert_action(
    cursor: &mut Cursor<&[u8]>,
    action: UpsertAction,
    version: ProtocolVersion,
) -> Result<()> {
    match action {
        UpsertAction::AddPlayer => {
            cursor.skip_string()?;
            cursor.skip_properties()
        }
        UpsertAction::InitializeChat => {
            if cursor.read_bool()? {
                // session id, key expiry, public key, key signature
                cursor.skip(16 + 8)?;
                cursor.skip_byte_array()?;
                cursor.skip_byte_array()?;
            }
            Ok(())
        }
        UpsertAction::UpdateGameMode
        | UpsertAction::UpdateLatency
        | UpsertAction::UpdateListOrder => cursor.read_varint().map(|_| ()),
        UpsertAction::UpdateListed | UpsertAction::UpdateHat => cursor.skip(1),
        UpsertAction::UpdateDisplayName => {
            if cursor.read_bool()? {
                if version.no_less_than(ProtocolVersion::MINECRAFT_1_20_3) {
                    skip_network_tag(cursor)?;
                } else {
                    cursor.skip_string()?;
                }
            }
            Ok(())
        }
    }
}

/// Player info update, 1.19.3 onwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpsertPlayerInfo {
    pub actions: u8,
    pub entries: Vec<PlayerInfoEntry>,
    pub remainder: Vec<u8>,
}

impl UpsertPlayerInfo {
    pub fn decode(payload: &[u8], version: ProtocolVersion) -> Result<Self> {
        if version.less_than(ProtocolVersion::MINECRAFT_1_19_3) {
            return Err(ProtocolError::UnsupportedVersion(version));
        }
        let mut cursor = Cursor::new(payload);
        let actions = cursor.read_ubyte()?;
        let known = upsert_action_count(version);
        if (actions as u16) >> known != 0 {
            return Err(ProtocolError::UnknownAction(actions as i32));
        }
        let present: Vec<UpsertAction> = UPSERT_ACTIONS[..known]
            .iter()
            .enumerate()
            .filter(|(bit, _)| actions & (1 << bit) != 0)
            .map(|(_, action)| *action)
            .collect();

        let entries = read_entries(&mut cursor, |cursor| {
            for action in &present {
                skip_upsert_action(cursor, *action, version)?;
            }
            Ok(())
        })?;
        Ok(UpsertPlayerInfo {
            actions,
            entries,
            remainder: cursor.rest(),
        })
    }

    pub fn encode(&self) -> std::io::Result<Vec<u8>> {
        let mut buf = vec![self.actions];
        write_entries(&mut buf, &self.entries)?;
        buf.extend_from_slice(&self.remainder);
        Ok(buf)
    }
}

/// Player info removal, 1.19.3 onwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovePlayerInfo {
    pub profiles: Vec<Uuid>,
    pub remainder: Vec<u8>,
}

impl RemovePlayerInfo {
    pub fn new(profiles: Vec<Uuid>) -> Self {
        RemovePlayerInfo {
            profiles,
            remainder: Vec::new(),
        }
    }

    pub fn decode(payload: &[u8], version: ProtocolVersion) -> Result<Self> {
        if version.less_than(ProtocolVersion::MINECRAFT_1_19_3) {
            return Err(ProtocolError::UnsupportedVersion(version));
        }
        let mut cursor = Cursor::new(payload);
        let count = read_count(&mut cursor)?;
        let mut profiles = Vec::new();
        for _ in 0..count {
            profiles.push(cursor.read_uuid()?);
        }
        Ok(RemovePlayerInfo {
            profiles,
            remainder: cursor.rest(),
        })
    }

    pub fn encode(&self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.profiles.len() * 16 + 5 + self.remainder.len());
        buf.write_varint(self.profiles.len() as i32)?;
        for profile in &self.profiles {
            buf.write_uuid(*profile)?;
        }
        buf.extend_from_slice(&self.remainder);
        Ok(buf)
    }
}

/// Single-action player list item, 1.8 up to 1.19.2.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyPlayerListItem {
    pub action: i32,
    pub items: Vec<PlayerInfoEntry>,
    pub remainder: Vec<u8>,
}

impl LegacyPlayerListItem {
    pub const ADD_PLAYER: i32 = 0;
    pub const UPDATE_GAMEMODE: i32 = 1;
    pub const UPDATE_LATENCY: i32 = 2;
    pub const UPDATE_DISPLAY_NAME: i32 = 3;
    pub const REMOVE_PLAYER: i32 = 4;

    pub fn remove(profiles: Vec<Uuid>) -> Self {
        LegacyPlayerListItem {
            action: Self::REMOVE_PLAYER,
            items: profiles.into_iter().map(PlayerInfoEntry::bare).collect(),
            remainder: Vec::new(),
        }
    }

    pub fn decode(payload: &[u8], version: ProtocolVersion) -> Result<Self> {
        if version.less_than(ProtocolVersion::MINECRAFT_1_8)
            || version.no_less_than(ProtocolVersion::MINECRAFT_1_19_3)
        {
            return Err(ProtocolError::UnsupportedVersion(version));
        }
        let mut cursor = Cursor::new(payload);
        let action = cursor.read_varint()?;
        if !(Self::ADD_PLAYER..=Self::REMOVE_PLAYER).contains(&action) {
            return Err(ProtocolError::UnknownAction(action));
        }
        let items = read_entries(&mut cursor, |cursor| match action {
            Self::ADD_PLAYER => {
                cursor.skip_string()?;
                cursor.skip_properties()?;
                cursor.read_varint()?;
                cursor.read_varint()?;
                if cursor.read_bool()? {
                    cursor.skip_string()?;
                }
                if version.no_less_than(ProtocolVersion::MINECRAFT_1_19) && cursor.read_bool()? {
                    cursor.skip(8)?;
                    cursor.skip_byte_array()?;
                    cursor.skip_byte_array()?;
                }
                Ok(())
            }
            Self::UPDATE_GAMEMODE | Self::UPDATE_LATENCY => cursor.read_varint().map(|_| ()),
            Self::UPDATE_DISPLAY_NAME => {
                if cursor.read_bool()? {
                    cursor.skip_string()?;
                }
                Ok(())
            }
            _ => Ok(()),
        })?;
        Ok(LegacyPlayerListItem {
            action,
            items,
            remainder: cursor.rest(),
        })
    }

    pub fn encode(&self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        buf.write_varint(self.action)?;
        write_entries(&mut buf, &self.items)?;
        buf.extend_from_slice(&self.remainder);
        Ok(buf)
    }
}
