use log::LevelFilter;
use std::time::Duration;

#[derive(serde_derive::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInfoForwarding {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "legacy")]
    Legacy,
    #[serde(rename = "bungeeguard")]
    BungeeGuard,
    #[serde(rename = "modern")]
    Modern,
}

fn forwarding_none() -> PlayerInfoForwarding {
    PlayerInfoForwarding::None
}

fn enabled() -> bool {
    true
}

fn database_path() -> String {
    "uuid_mapping.db".to_string()
}

fn cache_capacity() -> usize {
    1024
}

fn store_cooldown_secs() -> u64 {
    60 * 60
}

fn vacuum_interval_secs() -> u64 {
    24 * 60 * 60
}

fn busy_timeout_ms() -> u64 {
    1000
}

#[derive(serde_derive::Deserialize, Debug, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default = "database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            enabled: enabled(),
            path: database_path(),
        }
    }
}

#[derive(serde_derive::Deserialize, Debug, Clone)]
pub struct UuidRewriteConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default = "cache_capacity")]
    pub cache_capacity: usize,
    /// Unset keeps a disconnected player resolvable until the cache evicts it.
    #[serde(default)]
    pub retire_grace_secs: Option<u64>,
    #[serde(default = "store_cooldown_secs")]
    pub store_cooldown_secs: u64,
    #[serde(default = "vacuum_interval_secs")]
    pub vacuum_interval_secs: u64,
    #[serde(default = "busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl UuidRewriteConfig {
    pub fn retire_grace(&self) -> Option<Duration> {
        self.retire_grace_secs.map(Duration::from_secs)
    }

    pub fn vacuum_interval(&self) -> Duration {
        Duration::from_secs(self.vacuum_interval_secs)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for UuidRewriteConfig {
    fn default() -> Self {
        UuidRewriteConfig {
            enabled: false,
            database: DatabaseConfig::default(),
            cache_capacity: cache_capacity(),
            retire_grace_secs: None,
            store_cooldown_secs: store_cooldown_secs(),
            vacuum_interval_secs: vacuum_interval_secs(),
            busy_timeout_ms: busy_timeout_ms(),
        }
    }
}

#[derive(serde_derive::Deserialize, Debug, Clone)]
pub struct UmbrellaConfig {
    pub log_level: LevelFilter,
    pub online_mode: bool,
    #[serde(default = "forwarding_none")]
    pub player_info_forwarding: PlayerInfoForwarding,
    #[serde(default)]
    pub uuid_rewrite: UuidRewriteConfig,
}

impl UmbrellaConfig {
    /// Backends only see offline uuids when the proxy authenticates players
    /// but forwards nothing about them.
    pub fn is_uuid_rewrite_active(&self) -> bool {
        self.uuid_rewrite.enabled
            && self.online_mode
            && self.player_info_forwarding == PlayerInfoForwarding::None
    }
}
