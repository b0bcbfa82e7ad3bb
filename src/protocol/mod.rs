use std::fmt;

pub mod entity;
pub mod io;
pub mod nbt;
pub mod packet;
pub mod tab_list;
pub mod version_policy;

pub use packet::{PacketKind, RewritablePacket};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(pub i32);

impl ProtocolVersion {
    pub const MINECRAFT_1_8: ProtocolVersion = ProtocolVersion(47);
    pub const MINECRAFT_1_19: ProtocolVersion = ProtocolVersion(759);
    pub const MINECRAFT_1_19_3: ProtocolVersion = ProtocolVersion(761);
    pub const MINECRAFT_1_20_2: ProtocolVersion = ProtocolVersion(764);
    pub const MINECRAFT_1_20_3: ProtocolVersion = ProtocolVersion(765);
    pub const MINECRAFT_1_20_5: ProtocolVersion = ProtocolVersion(766);
    pub const MINECRAFT_1_21_2: ProtocolVersion = ProtocolVersion(768);
    pub const MINECRAFT_1_21_4: ProtocolVersion = ProtocolVersion(769);

    pub fn no_less_than(self, other: ProtocolVersion) -> bool {
        self >= other
    }

    pub fn less_than(self, other: ProtocolVersion) -> bool {
        self < other
    }
}

impl From<i32> for ProtocolVersion {
    fn from(value: i32) -> Self {
        ProtocolVersion(value)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "protocol {}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("i/o error while reading packet: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported {0} for this packet")]
    UnsupportedVersion(ProtocolVersion),
    #[error("invalid length {0}")]
    InvalidLength(i64),
    #[error("unknown nbt tag type {0}")]
    UnknownNbtTag(u8),
    #[error("nbt nested deeper than {0}")]
    NbtTooDeep(usize),
    #[error("unknown player info action {0}")]
    UnknownAction(i32),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
