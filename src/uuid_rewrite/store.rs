//! Durable online/offline/name history in SQLite.
//!
//! One connection, one lock: SQLite does not take concurrent writers, so every
//! read and write queues up here, for at most the busy timeout. Failures and
//! timeouts are logged and read as a miss.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::cfg::UuidRewriteConfig;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS uuid_mapping (
        online_uuid TEXT PRIMARY KEY,
        offline_uuid TEXT NOT NULL,
        player_name TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_offline_uuid ON uuid_mapping (offline_uuid);
    CREATE INDEX IF NOT EXISTS idx_updated_at ON uuid_mapping (updated_at);
";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Disabled,
    /// Same triple already recorded within the cooldown.
    Skipped,
    Written,
    Failed,
}

pub struct MappingStore {
    connection: Mutex<Option<Connection>>,
    enabled: AtomicBool,
    cooldown_secs: i64,
    busy_timeout: Duration,
    vacuum_interval: Duration,
    last_vacuum: Mutex<Option<Instant>>,
}

impl MappingStore {
    /// A closed, disabled store. Nothing touches disk until [`open`](Self::open).
    pub fn new(config: &UuidRewriteConfig) -> MappingStore {
        MappingStore {
            connection: Mutex::new(None),
            enabled: AtomicBool::new(false),
            cooldown_secs: config.store_cooldown_secs as i64,
            busy_timeout: config.busy_timeout(),
            vacuum_interval: config.vacuum_interval(),
            last_vacuum: Mutex::new(None),
        }
    }

    pub fn open(&self, path: &str) -> anyhow::Result<()> {
        let connection =
            Connection::open(path).with_context(|| format!("failed to open database '{path}'"))?;
        self.install(connection)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory(&self) -> anyhow::Result<()> {
        self.install(Connection::open_in_memory()?)
    }

    fn install(&self, connection: Connection) -> anyhow::Result<()> {
        connection.busy_timeout(self.busy_timeout)?;
        connection
            .execute_batch(SCHEMA)
            .context("failed to create uuid_mapping schema")?;
        *self.connection.lock() = Some(connection);
        self.set_enabled(true);
        Ok(())
    }

    pub fn close(&self) {
        self.set_enabled(false);
        if let Some(connection) = self.connection.lock().take() {
            if let Err((_, err)) = connection.close() {
                log::error!("Closing uuid mapping database failed: {}", err);
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    fn with_connection<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> Option<T> {
        if !self.is_enabled() {
            return None;
        }
        let Some(mut guard) = self.connection.try_lock_for(self.busy_timeout) else {
            log::warn!(
                "uuid mapping {} gave up after waiting {:?} for the database",
                operation,
                self.busy_timeout
            );
            return None;
        };
        let connection = guard.as_mut()?;
        match f(connection) {
            Ok(value) => Some(value),
            Err(err) => {
                log::error!("uuid mapping {} failed: {}", operation, err);
                None
            }
        }
    }

    fn parse(operation: &str, value: String) -> Option<Uuid> {
        match Uuid::parse_str(&value) {
            Ok(uuid) => Some(uuid),
            Err(err) => {
                log::error!("uuid mapping {} read malformed uuid '{}': {}", operation, value, err);
                None
            }
        }
    }

    pub fn lookup_online(&self, offline_uuid: Uuid) -> Option<Uuid> {
        self.with_connection("lookup_online", |connection| {
            connection
                .query_row(
                    "SELECT online_uuid FROM uuid_mapping WHERE offline_uuid = ?1 \
                     ORDER BY updated_at DESC, rowid DESC LIMIT 1",
                    params![offline_uuid.to_string()],
                    |row| row.get::<_, String>(0),
                )
                .optional()
        })
        .flatten()
        .and_then(|value| Self::parse("lookup_online", value))
    }

    pub fn lookup_offline(&self, online_uuid: Uuid) -> Option<Uuid> {
        self.with_connection("lookup_offline", |connection| {
            connection
                .query_row(
                    "SELECT offline_uuid FROM uuid_mapping WHERE online_uuid = ?1 \
                     ORDER BY updated_at DESC, rowid DESC LIMIT 1",
                    params![online_uuid.to_string()],
                    |row| row.get::<_, String>(0),
                )
                .optional()
        })
        .flatten()
        .and_then(|value| Self::parse("lookup_offline", value))
    }

    pub fn upsert(&self, online_uuid: Uuid, offline_uuid: Uuid, name: &str) -> UpsertOutcome {
        self.upsert_at(online_uuid, offline_uuid, name, chrono::Utc::now().timestamp())
    }

    pub(crate) fn upsert_at(
        &self,
        online_uuid: Uuid,
        offline_uuid: Uuid,
        name: &str,
        now: i64,
    ) -> UpsertOutcome {
        if !self.is_enabled() {
            return UpsertOutcome::Disabled;
        }
        let cooldown_secs = self.cooldown_secs;
        let written = self.with_connection("upsert", |connection| {
            write_mapping(connection, online_uuid, offline_uuid, name, now, cooldown_secs)
        });
        match written {
            Some(true) => UpsertOutcome::Written,
            Some(false) => UpsertOutcome::Skipped,
            None if self.is_enabled() => UpsertOutcome::Failed,
            None => UpsertOutcome::Disabled,
        }
    }

    /// Reclaims pages left behind by superseded rows.
    pub fn vacuum(&self) -> bool {
        self.with_connection("vacuum", |connection| connection.execute_batch("VACUUM"))
            .is_some()
    }

    /// Vacuums at most once per configured interval.
    pub fn vacuum_if_due(&self) -> bool {
        let now = Instant::now();
        {
            let mut last_vacuum = self.last_vacuum.lock();
            if last_vacuum.is_some_and(|at| now.duration_since(at) < self.vacuum_interval) {
                return false;
            }
            *last_vacuum = Some(now);
        }
        let vacuumed = self.vacuum();
        if vacuumed {
            log::debug!("Vacuumed uuid mapping database");
        }
        vacuumed
    }

    #[cfg(test)]
    pub(crate) fn row_count(&self) -> i64 {
        self.with_connection("row_count", |connection| {
            connection.query_row("SELECT COUNT(*) FROM uuid_mapping", [], |row| row.get(0))
        })
        .unwrap_or(0)
    }
}

fn write_mapping(
    connection: &mut Connection,
    online_uuid: Uuid,
    offline_uuid: Uuid,
    name: &str,
    now: i64,
    cooldown_secs: i64,
) -> rusqlite::Result<bool> {
    let online = online_uuid.to_string();
    let offline = offline_uuid.to_string();

    let existing: Option<(String, String, i64)> = connection
        .query_row(
            "SELECT offline_uuid, player_name, updated_at FROM uuid_mapping WHERE online_uuid = ?1",
            params![online],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    if let Some((stored_offline, stored_name, updated_at)) = existing {
        if stored_offline == offline && stored_name == name && now - updated_at < cooldown_secs {
            return Ok(false);
        }
    }

    log::debug!("Recording uuid mapping {} {} {}", online, offline, name);
    let tx = connection.transaction()?;
    let deleted = tx.execute(
        "DELETE FROM uuid_mapping WHERE offline_uuid = ?1",
        params![offline],
    )?;
    tx.execute(
        "INSERT OR REPLACE INTO uuid_mapping (online_uuid, offline_uuid, player_name, updated_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![online, offline, name, now],
    )?;
    tx.commit()?;
    if deleted > 0 {
        log::debug!("Superseded {} mapping(s) for offline uuid {}", deleted, offline);
    }
    Ok(true)
}
