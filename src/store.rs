//! SQLite-backed metrics storage.
//!
//! One append-only table per metric kind. The store assigns timestamps at
//! insert time and hands the full stored row back so the caller broadcasts
//! exactly what was persisted. Uses WAL mode for concurrent read/write
//! safety.

use crate::error::Result;
use crate::metrics::data::{
    NetworkMetricSample, NetworkSampleDraft, SystemMetricSample, SystemSampleDraft,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// DDL for the metric tables.
pub(crate) const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS system_metrics (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp    INTEGER NOT NULL DEFAULT (strftime('%s','now')),
    cpu_usage    REAL NOT NULL,
    memory_used  REAL NOT NULL,
    memory_total REAL NOT NULL,
    disk_used    REAL NOT NULL,
    disk_total   REAL NOT NULL,
    temperature  REAL,
    uptime       INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_system_metrics_timestamp ON system_metrics (timestamp);

CREATE TABLE IF NOT EXISTS network_metrics (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp         INTEGER NOT NULL DEFAULT (strftime('%s','now')),
    interface_name    TEXT NOT NULL,
    download_speed    REAL NOT NULL,
    upload_speed      REAL NOT NULL,
    connected_devices INTEGER
);
CREATE INDEX IF NOT EXISTS idx_network_metrics_timestamp ON network_metrics (timestamp);
";

/// SQLite-backed sample storage with optional retention pruning.
pub struct MetricsStore {
    conn: Mutex<Connection>,
    retention_days: u32,
}

impl MetricsStore {
    /// Open or create a metrics store at the given path.
    ///
    /// `retention_days` of 0 keeps every row forever; any other value prunes
    /// rows older than that many days after each insert.
    pub fn open(db_path: &Path, retention_days: u32) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(SCHEMA)?;
        debug!("metrics store opened at {}", db_path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            retention_days,
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory(retention_days: u32) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            retention_days,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("metrics store mutex poisoned")
    }

    /// Persist one system sample and return the stored row, including the
    /// store-assigned id and timestamp.
    pub fn insert_system(&self, draft: &SystemSampleDraft) -> Result<SystemMetricSample> {
        let conn = self.lock();
        let sample = conn.query_row(
            "INSERT INTO system_metrics \
             (cpu_usage, memory_used, memory_total, disk_used, disk_total, temperature, uptime) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             RETURNING id, timestamp, cpu_usage, memory_used, memory_total, \
                       disk_used, disk_total, temperature, uptime",
            params![
                draft.cpu_usage,
                draft.memory_used,
                draft.memory_total,
                draft.disk_used,
                draft.disk_total,
                draft.temperature,
                draft.uptime as i64,
            ],
            system_from_row,
        )?;

        self.prune_old_rows(&conn)?;
        Ok(sample)
    }

    /// Persist one network sample and return the stored row.
    pub fn insert_network(&self, draft: &NetworkSampleDraft) -> Result<NetworkMetricSample> {
        let conn = self.lock();
        let sample = conn.query_row(
            "INSERT INTO network_metrics \
             (interface_name, download_speed, upload_speed, connected_devices) \
             VALUES (?1, ?2, ?3, ?4) \
             RETURNING id, timestamp, interface_name, download_speed, upload_speed, \
                       connected_devices",
            params![
                draft.interface_name,
                draft.download_speed,
                draft.upload_speed,
                draft.connected_devices,
            ],
            network_from_row,
        )?;

        self.prune_old_rows(&conn)?;
        Ok(sample)
    }

    /// The most recent system sample, if any exist.
    pub fn latest_system(&self) -> Result<Option<SystemMetricSample>> {
        let conn = self.lock();
        let sample = conn
            .query_row(
                "SELECT id, timestamp, cpu_usage, memory_used, memory_total, \
                        disk_used, disk_total, temperature, uptime \
                 FROM system_metrics ORDER BY timestamp DESC, id DESC LIMIT 1",
                [],
                system_from_row,
            )
            .optional()?;
        Ok(sample)
    }

    /// All system samples with `timestamp >= since`, ascending.
    pub fn system_history_since(&self, since: i64) -> Result<Vec<SystemMetricSample>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, cpu_usage, memory_used, memory_total, \
                    disk_used, disk_total, temperature, uptime \
             FROM system_metrics WHERE timestamp >= ?1 ORDER BY timestamp ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![since], system_from_row)?;
        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?);
        }
        Ok(samples)
    }

    /// The most recent network sample, if any exist.
    pub fn latest_network(&self) -> Result<Option<NetworkMetricSample>> {
        let conn = self.lock();
        let sample = conn
            .query_row(
                "SELECT id, timestamp, interface_name, download_speed, upload_speed, \
                        connected_devices \
                 FROM network_metrics ORDER BY timestamp DESC, id DESC LIMIT 1",
                [],
                network_from_row,
            )
            .optional()?;
        Ok(sample)
    }

    /// All network samples with `timestamp >= since`, ascending.
    pub fn network_history_since(&self, since: i64) -> Result<Vec<NetworkMetricSample>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, interface_name, download_speed, upload_speed, \
                    connected_devices \
             FROM network_metrics WHERE timestamp >= ?1 ORDER BY timestamp ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![since], network_from_row)?;
        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?);
        }
        Ok(samples)
    }

    /// Number of stored system samples.
    pub fn system_count(&self) -> Result<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM system_metrics", [], |row| {
            row.get(0)
        })?;
        Ok(count as u64)
    }

    /// Number of stored network samples.
    pub fn network_count(&self) -> Result<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM network_metrics", [], |row| {
            row.get(0)
        })?;
        Ok(count as u64)
    }

    /// Delete rows older than the configured retention period.
    fn prune_old_rows(&self, conn: &Connection) -> Result<()> {
        if self.retention_days == 0 {
            return Ok(());
        }

        let cutoff = Utc::now().timestamp() - i64::from(self.retention_days) * 86_400;
        conn.execute(
            "DELETE FROM system_metrics WHERE timestamp < ?1",
            params![cutoff],
        )?;
        conn.execute(
            "DELETE FROM network_metrics WHERE timestamp < ?1",
            params![cutoff],
        )?;
        Ok(())
    }

    /// Run arbitrary SQL against the store (test fault injection).
    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.lock().execute_batch(sql)?;
        Ok(())
    }

    /// Insert a system sample with an explicit timestamp (test fixtures).
    #[cfg(test)]
    pub(crate) fn insert_system_at(
        &self,
        draft: &SystemSampleDraft,
        timestamp: i64,
    ) -> Result<SystemMetricSample> {
        let conn = self.lock();
        let sample = conn.query_row(
            "INSERT INTO system_metrics \
             (timestamp, cpu_usage, memory_used, memory_total, disk_used, disk_total, \
              temperature, uptime) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             RETURNING id, timestamp, cpu_usage, memory_used, memory_total, \
                       disk_used, disk_total, temperature, uptime",
            params![
                timestamp,
                draft.cpu_usage,
                draft.memory_used,
                draft.memory_total,
                draft.disk_used,
                draft.disk_total,
                draft.temperature,
                draft.uptime as i64,
            ],
            system_from_row,
        )?;
        Ok(sample)
    }

    /// Insert a network sample with an explicit timestamp (test fixtures).
    #[cfg(test)]
    pub(crate) fn insert_network_at(
        &self,
        draft: &NetworkSampleDraft,
        timestamp: i64,
    ) -> Result<NetworkMetricSample> {
        let conn = self.lock();
        let sample = conn.query_row(
            "INSERT INTO network_metrics \
             (timestamp, interface_name, download_speed, upload_speed, connected_devices) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING id, timestamp, interface_name, download_speed, upload_speed, \
                       connected_devices",
            params![
                timestamp,
                draft.interface_name,
                draft.download_speed,
                draft.upload_speed,
                draft.connected_devices,
            ],
            network_from_row,
        )?;
        Ok(sample)
    }
}

impl std::fmt::Debug for MetricsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsStore")
            .field("retention_days", &self.retention_days)
            .finish_non_exhaustive()
    }
}

fn system_from_row(row: &Row<'_>) -> rusqlite::Result<SystemMetricSample> {
    Ok(SystemMetricSample {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        cpu_usage: row.get(2)?,
        memory_used: row.get(3)?,
        memory_total: row.get(4)?,
        disk_used: row.get(5)?,
        disk_total: row.get(6)?,
        temperature: row.get(7)?,
        uptime: row.get(8)?,
    })
}

fn network_from_row(row: &Row<'_>) -> rusqlite::Result<NetworkMetricSample> {
    Ok(NetworkMetricSample {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        interface_name: row.get(2)?,
        download_speed: row.get(3)?,
        upload_speed: row.get(4)?,
        connected_devices: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_draft() -> SystemSampleDraft {
        SystemSampleDraft {
            cpu_usage: 25.5,
            memory_used: 3.7,
            memory_total: 8.0,
            disk_used: 120.4,
            disk_total: 500.0,
            temperature: Some(48.2),
            uptime: 86_400,
        }
    }

    fn network_draft() -> NetworkSampleDraft {
        NetworkSampleDraft {
            interface_name: "eth0".to_string(),
            download_speed: 5.4,
            upload_speed: 0.3,
            connected_devices: Some(6),
        }
    }

    #[test]
    fn test_open_creates_schema_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.db");

        let store = MetricsStore::open(&path, 0).unwrap();
        assert_eq!(store.system_count().unwrap(), 0);
        store.insert_system(&system_draft()).unwrap();

        // Reopening sees the previously written row.
        drop(store);
        let reopened = MetricsStore::open(&path, 0).unwrap();
        assert_eq!(reopened.system_count().unwrap(), 1);
    }

    #[test]
    fn test_insert_assigns_id_and_timestamp() {
        let store = MetricsStore::open_in_memory(0).unwrap();

        let stored = store.insert_system(&system_draft()).unwrap();
        assert!(stored.id > 0);
        assert!(stored.timestamp > 0);
        assert_eq!(stored.cpu_usage, 25.5);
        assert_eq!(stored.temperature, Some(48.2));
        assert_eq!(stored.uptime, 86_400);

        let network = store.insert_network(&network_draft()).unwrap();
        assert!(network.id > 0);
        assert_eq!(network.interface_name, "eth0");
        assert_eq!(network.connected_devices, Some(6));
    }

    #[test]
    fn test_latest_on_empty_store_is_none() {
        let store = MetricsStore::open_in_memory(0).unwrap();
        assert!(store.latest_system().unwrap().is_none());
        assert!(store.latest_network().unwrap().is_none());
    }

    #[test]
    fn test_latest_returns_most_recent_row() {
        let store = MetricsStore::open_in_memory(0).unwrap();
        store.insert_system_at(&system_draft(), 1_000).unwrap();

        let mut newer = system_draft();
        newer.cpu_usage = 80.0;
        store.insert_system_at(&newer, 2_000).unwrap();

        let latest = store.latest_system().unwrap().unwrap();
        assert_eq!(latest.timestamp, 2_000);
        assert_eq!(latest.cpu_usage, 80.0);
    }

    #[test]
    fn test_history_lower_bound_is_inclusive_and_ascending() {
        let store = MetricsStore::open_in_memory(0).unwrap();
        store.insert_system_at(&system_draft(), 999).unwrap();
        store.insert_system_at(&system_draft(), 1_000).unwrap();
        store.insert_system_at(&system_draft(), 1_001).unwrap();

        let history = store.system_history_since(1_000).unwrap();
        let timestamps: Vec<i64> = history.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![1_000, 1_001]);
    }

    #[test]
    fn test_history_on_empty_store_is_empty() {
        let store = MetricsStore::open_in_memory(0).unwrap();
        assert!(store.system_history_since(0).unwrap().is_empty());
        assert!(store.network_history_since(0).unwrap().is_empty());
    }

    #[test]
    fn test_network_history_ordering() {
        let store = MetricsStore::open_in_memory(0).unwrap();
        store.insert_network_at(&network_draft(), 300).unwrap();
        store.insert_network_at(&network_draft(), 100).unwrap();
        store.insert_network_at(&network_draft(), 200).unwrap();

        let history = store.network_history_since(0).unwrap();
        let timestamps: Vec<i64> = history.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![100, 200, 300]);
    }

    #[test]
    fn test_absent_optional_fields_round_trip() {
        let store = MetricsStore::open_in_memory(0).unwrap();

        let mut draft = system_draft();
        draft.temperature = None;
        let stored = store.insert_system(&draft).unwrap();
        assert_eq!(stored.temperature, None);
        assert_eq!(store.latest_system().unwrap().unwrap().temperature, None);

        let mut network = network_draft();
        network.connected_devices = None;
        let stored = store.insert_network(&network).unwrap();
        assert_eq!(stored.connected_devices, None);
    }

    #[test]
    fn test_retention_prunes_old_rows_on_insert() {
        let store = MetricsStore::open_in_memory(7).unwrap();

        let stale = Utc::now().timestamp() - 30 * 86_400;
        store.insert_system_at(&system_draft(), stale).unwrap();
        store.insert_network_at(&network_draft(), stale).unwrap();
        assert_eq!(store.system_count().unwrap(), 1);

        // A fresh insert triggers pruning of everything past retention.
        store.insert_system(&system_draft()).unwrap();
        store.insert_network(&network_draft()).unwrap();
        assert_eq!(store.system_count().unwrap(), 1);
        assert_eq!(store.network_count().unwrap(), 1);
        assert!(store.latest_system().unwrap().unwrap().timestamp > stale);
    }

    #[test]
    fn test_retention_zero_keeps_everything() {
        let store = MetricsStore::open_in_memory(0).unwrap();
        store.insert_system_at(&system_draft(), 1).unwrap();
        store.insert_system(&system_draft()).unwrap();
        assert_eq!(store.system_count().unwrap(), 2);
    }
}
