//! SQLite-backed route history and traffic pattern store.
//!
//! One database file with two tables: `saved_routes` and `traffic_patterns`.
//! Traffic observations are accumulated server-side with a single upsert
//! statement, so concurrent writers never lose a sample.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::error::StoreError;
use crate::model::{Route, TrafficKey, TrafficPattern};
use crate::traits::{Deadline, RouteStore, TrafficHistoryStore};

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous  = NORMAL;
    CREATE TABLE IF NOT EXISTS saved_routes (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id        TEXT    NOT NULL,
        start_lat      REAL    NOT NULL,
        start_lng      REAL    NOT NULL,
        end_lat        REAL    NOT NULL,
        end_lng        REAL    NOT NULL,
        distance       REAL    NOT NULL,
        duration_secs  INTEGER NOT NULL,
        co2_emission   REAL    NOT NULL,
        transport_mode TEXT    NOT NULL,
        start_address  TEXT,
        end_address    TEXT,
        created_at     TEXT    NOT NULL
    );
    CREATE INDEX IF NOT EXISTS saved_routes_user ON saved_routes (user_id);
    CREATE TABLE IF NOT EXISTS traffic_patterns (
        start_lat      REAL    NOT NULL,
        start_lng      REAL    NOT NULL,
        end_lat        REAL    NOT NULL,
        end_lng        REAL    NOT NULL,
        day_of_week    INTEGER NOT NULL,
        hour_of_day    INTEGER NOT NULL,
        total_duration REAL    NOT NULL,
        sample_count   INTEGER NOT NULL,
        last_updated   TEXT    NOT NULL,
        PRIMARY KEY (start_lat, start_lng, end_lat, end_lng, day_of_week, hour_of_day)
    );";

/// Lock wait before a busy database is reported as an error.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep between attempts on a connection held by another caller.
const LOCK_POLL: Duration = Duration::from_millis(2);

/// A persisted route summary as stored in `saved_routes`.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRoute {
    pub id: i64,
    pub user_id: String,
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_lat: f64,
    pub end_lng: f64,
    pub distance: f64,
    pub duration_secs: i64,
    pub co2_emission: f64,
    pub transport_mode: String,
    pub start_address: Option<String>,
    pub end_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Waits for the connection no longer than `deadline`, then bounds
    /// SQLite's own lock wait by whatever time is left.
    fn lock(&self, deadline: Deadline) -> Result<MutexGuard<'_, Connection>, StoreError> {
        loop {
            let Some(left) = deadline.timeout_capped(BUSY_TIMEOUT) else {
                return Err(StoreError::DeadlineExceeded);
            };
            match self.conn.try_lock() {
                Ok(conn) => {
                    conn.busy_timeout(left)?;
                    return Ok(conn);
                }
                Err(TryLockError::WouldBlock) => thread::sleep(LOCK_POLL.min(left)),
                Err(TryLockError::Poisoned(_)) => return Err(StoreError::Poisoned),
            }
        }
    }

    /// All saved routes for `user_id`, oldest first.
    pub fn list_routes_for_user(&self, user_id: &str) -> Result<Vec<SavedRoute>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, user_id, start_lat, start_lng, end_lat, end_lng, distance, \
                    duration_secs, co2_emission, transport_mode, start_address, end_address, created_at \
             FROM saved_routes WHERE user_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            Ok(SavedRoute {
                id: row.get(0)?,
                user_id: row.get(1)?,
                start_lat: row.get(2)?,
                start_lng: row.get(3)?,
                end_lat: row.get(4)?,
                end_lng: row.get(5)?,
                distance: row.get(6)?,
                duration_secs: row.get(7)?,
                co2_emission: row.get(8)?,
                transport_mode: row.get(9)?,
                start_address: row.get(10)?,
                end_address: row.get(11)?,
                created_at: row.get(12)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl RouteStore for SqliteStore {
    fn save(&self, route: &Route, deadline: Deadline) -> Result<i64, StoreError> {
        let conn = self.lock(deadline)?;
        conn.execute(
            "INSERT INTO saved_routes \
             (user_id, start_lat, start_lng, end_lat, end_lng, distance, duration_secs, \
              co2_emission, transport_mode, start_address, end_address, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                route.user_id,
                route.start_location.latitude,
                route.start_location.longitude,
                route.end_location.latitude,
                route.end_location.longitude,
                route.total_distance(),
                route.total_duration().as_secs() as i64,
                route.total_emission(),
                route.primary_mode().as_str(),
                route.start_location.address,
                route.end_location.address,
                route.created_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl TrafficHistoryStore for SqliteStore {
    fn get(&self, key: &TrafficKey, deadline: Deadline) -> Result<Option<TrafficPattern>, StoreError> {
        let conn = self.lock(deadline)?;
        let row = conn
            .query_row(
                "SELECT total_duration, sample_count, last_updated FROM traffic_patterns \
                 WHERE start_lat = ?1 AND start_lng = ?2 AND end_lat = ?3 AND end_lng = ?4 \
                   AND day_of_week = ?5 AND hour_of_day = ?6",
                rusqlite::params![
                    key.start_lat,
                    key.start_lng,
                    key.end_lat,
                    key.end_lng,
                    key.day_of_week,
                    key.hour_of_day,
                ],
                |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, DateTime<Utc>>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(row
            .filter(|(_, count, _)| *count > 0)
            .map(|(total, sample_count, last_updated)| TrafficPattern {
                key: *key,
                average_duration_secs: total / f64::from(sample_count),
                sample_count,
                last_updated,
            }))
    }

    fn upsert(&self, key: &TrafficKey, observed: Duration, deadline: Deadline) -> Result<(), StoreError> {
        let conn = self.lock(deadline)?;
        conn.execute(
            "INSERT INTO traffic_patterns \
             (start_lat, start_lng, end_lat, end_lng, day_of_week, hour_of_day, \
              total_duration, sample_count, last_updated) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8) \
             ON CONFLICT (start_lat, start_lng, end_lat, end_lng, day_of_week, hour_of_day) \
             DO UPDATE SET total_duration = total_duration + excluded.total_duration, \
                           sample_count   = sample_count + 1, \
                           last_updated   = excluded.last_updated",
            rusqlite::params![
                key.start_lat,
                key.start_lng,
                key.end_lat,
                key.end_lng,
                key.day_of_week,
                key.hour_of_day,
                observed.as_secs_f64(),
                Utc::now(),
            ],
        )?;
        Ok(())
    }
}
