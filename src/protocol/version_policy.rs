use super::{ProtocolError, ProtocolVersion, Result};

/// Player entity type id per breakpoint, newest first. A breakpoint covers
/// every version up to the next one. Ids come from the vanilla registry dumps.
const PLAYER_ENTITY_TYPES: &[(ProtocolVersion, i32)] = &[
    (ProtocolVersion::MINECRAFT_1_21_4, 147),
    (ProtocolVersion::MINECRAFT_1_21_2, 148),
    (ProtocolVersion::MINECRAFT_1_20_5, 128),
    (ProtocolVersion::MINECRAFT_1_20_3, 124),
    (ProtocolVersion::MINECRAFT_1_20_2, 122),
];

/// Older versions carry players in a dedicated spawn packet, so there is no
/// safe answer for them.
pub fn player_entity_type(version: ProtocolVersion) -> Result<i32> {
    PLAYER_ENTITY_TYPES
        .iter()
        .find(|(breakpoint, _)| version.no_less_than(*breakpoint))
        .map(|(_, entity_type)| *entity_type)
        .ok_or(ProtocolError::UnsupportedVersion(version))
}
