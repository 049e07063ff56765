//! SQLite-backed program guide store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use super::{
    CachedChannel, EpgStore, IndexableEvent, StoreError, SyncMeta, SyncStatus, TimerangeFilter,
};
use crate::upstream::{Channel, EpgEvent};

/// Column list shared by every event query; `row_to_event` depends on this order.
const EVENT_COLUMNS: &str = "event_id, channel_uuid, channel_name, channel_number, channel_icon,
    start, stop, duration, title, subtitle, summary, description,
    genre, content_type, series_link, episode_number, season_number,
    part_number, part_count, episode_uri, image, next_event_id,
    age_rating, star_rating, hd, widescreen, audio_desc, subtitled";

const CHANNEL_COLUMNS: &str = "uuid, enabled, name, number, icon, icon_public_url";

/// Upper bound on ids bound into a single `IN (...)` clause.
const ID_BATCH_SIZE: usize = 500;

/// SQLite-backed program guide store.
///
/// File-backed stores keep a dedicated read-only connection next to the
/// writer. With WAL enabled, reads see the last committed snapshot and never
/// wait on an open replace transaction.
pub struct SqliteEpgStore {
    writer: Mutex<Connection>,
    reader: Option<Mutex<Connection>>,
}

impl SqliteEpgStore {
    /// Open (or create) a database file, creating parent directories as needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        // Readers keep a consistent snapshot while a replace transaction is open.
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;

        let reader = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!(path = %path.display(), "Opened EPG store");
        Ok(Self {
            writer: Mutex::new(conn),
            reader: Some(Mutex::new(reader)),
        })
    }

    /// Create an in-memory store (useful for testing).
    ///
    /// Reads and writes share the single connection.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            writer: Mutex::new(conn),
            reader: None,
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                event_id INTEGER PRIMARY KEY,
                channel_uuid TEXT NOT NULL,
                channel_name TEXT NOT NULL,
                channel_number INTEGER,
                channel_icon TEXT,
                start INTEGER NOT NULL,
                stop INTEGER NOT NULL,
                duration INTEGER,
                title TEXT NOT NULL,
                subtitle TEXT,
                summary TEXT,
                description TEXT,
                genre TEXT,
                content_type INTEGER,
                series_link TEXT,
                episode_number INTEGER,
                season_number INTEGER,
                part_number INTEGER,
                part_count INTEGER,
                episode_uri TEXT,
                image TEXT,
                next_event_id INTEGER,
                age_rating INTEGER,
                star_rating INTEGER,
                hd INTEGER,
                widescreen INTEGER,
                audio_desc INTEGER,
                subtitled INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_events_timerange ON events(start, stop);
            CREATE INDEX IF NOT EXISTS idx_events_channel_timerange ON events(channel_uuid, start, stop);
            CREATE INDEX IF NOT EXISTS idx_events_content_type ON events(content_type);

            CREATE TABLE IF NOT EXISTS channels (
                uuid TEXT PRIMARY KEY,
                enabled INTEGER NOT NULL DEFAULT 1,
                name TEXT NOT NULL,
                number INTEGER,
                icon TEXT,
                icon_public_url TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_channels_number ON channels(number);

            -- Singleton freshness record
            CREATE TABLE IF NOT EXISTS sync_meta (
                id INTEGER PRIMARY KEY CHECK(id = 1),
                last_refresh_start INTEGER NOT NULL DEFAULT 0,
                last_refresh_end INTEGER NOT NULL DEFAULT 0,
                last_refresh_duration INTEGER NOT NULL DEFAULT 0,
                event_count INTEGER NOT NULL DEFAULT 0,
                channel_count INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'idle'
            );

            INSERT OR IGNORE INTO sync_meta (id) VALUES (1);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn write_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        Self::lock(&self.writer)
    }

    fn read_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        Self::lock(self.reader.as_ref().unwrap_or(&self.writer))
    }

    fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
        conn.lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    /// Convert a row selected with `EVENT_COLUMNS` to an event.
    ///
    /// Flags are always written, so they read back as explicit booleans.
    fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<EpgEvent> {
        let genre_json: Option<String> = row.get(12)?;
        let genre = match genre_json {
            Some(json) => Some(serde_json::from_str::<Vec<i64>>(&json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e))
            })?),
            None => None,
        };

        Ok(EpgEvent {
            event_id: row.get(0)?,
            channel_uuid: row.get(1)?,
            channel_name: row.get(2)?,
            channel_number: row.get(3)?,
            channel_icon: row.get(4)?,
            start: row.get(5)?,
            stop: row.get(6)?,
            duration: row.get(7)?,
            title: row.get(8)?,
            subtitle: row.get(9)?,
            summary: row.get(10)?,
            description: row.get(11)?,
            genre,
            content_type: row.get(13)?,
            series_link: row.get(14)?,
            episode_number: row.get(15)?,
            season_number: row.get(16)?,
            part_number: row.get(17)?,
            part_count: row.get(18)?,
            episode_uri: row.get(19)?,
            image: row.get(20)?,
            next_event_id: row.get(21)?,
            age_rating: row.get(22)?,
            star_rating: row.get(23)?,
            hd: row.get(24)?,
            widescreen: row.get(25)?,
            audio_desc: row.get(26)?,
            subtitled: row.get(27)?,
        })
    }

    fn row_to_channel(row: &rusqlite::Row) -> rusqlite::Result<CachedChannel> {
        Ok(CachedChannel {
            uuid: row.get(0)?,
            enabled: row.get(1)?,
            name: row.get(2)?,
            number: row.get(3)?,
            icon: row.get(4)?,
            icon_public_url: row.get(5)?,
        })
    }

    fn query_events(
        conn: &Connection,
        sql: &str,
        values: Vec<Value>,
    ) -> Result<Vec<EpgEvent>, StoreError> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(values), Self::row_to_event)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(events)
    }

    fn query_channel(
        conn: &Connection,
        column: &str,
        value: Value,
    ) -> Result<Option<CachedChannel>, StoreError> {
        let sql = format!("SELECT {} FROM channels WHERE {} = ?", CHANNEL_COLUMNS, column);
        conn.query_row(&sql, params![value], Self::row_to_channel)
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn count(conn: &Connection, table: &str) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        conn.query_row(&sql, [], |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

/// Parse a channel identifier as a display number.
///
/// Only canonical integer renderings qualify, so "01", "+1" and "1.5" are
/// left to the UUID lookup.
fn parse_channel_number(identifier: &str) -> Option<i64> {
    let number: i64 = identifier.parse().ok()?;
    (number.to_string() == identifier).then_some(number)
}

impl EpgStore for SqliteEpgStore {
    fn replace_all_events(&self, events: &[EpgEvent]) -> Result<(), StoreError> {
        let mut conn = self.write_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.execute("DELETE FROM events", [])
            .map_err(|e| StoreError::Database(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO events ({}) VALUES (
                        ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                        ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
                    )",
                    EVENT_COLUMNS
                ))
                .map_err(|e| StoreError::Database(e.to_string()))?;

            for event in events {
                let genre = match &event.genre {
                    Some(codes) => Some(
                        serde_json::to_string(codes)
                            .map_err(|e| StoreError::Database(e.to_string()))?,
                    ),
                    None => None,
                };

                stmt.execute(params![
                    event.event_id,
                    &event.channel_uuid,
                    &event.channel_name,
                    event.channel_number,
                    &event.channel_icon,
                    event.start,
                    event.stop,
                    event.duration,
                    &event.title,
                    &event.subtitle,
                    &event.summary,
                    &event.description,
                    genre,
                    event.content_type,
                    &event.series_link,
                    event.episode_number,
                    event.season_number,
                    event.part_number,
                    event.part_count,
                    &event.episode_uri,
                    &event.image,
                    event.next_event_id,
                    event.age_rating,
                    event.star_rating,
                    event.hd.unwrap_or(false),
                    event.widescreen.unwrap_or(false),
                    event.audio_desc.unwrap_or(false),
                    event.subtitled.unwrap_or(false),
                ])
                .map_err(|e| StoreError::Database(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!(count = events.len(), "Replaced all events");
        Ok(())
    }

    fn replace_all_channels(&self, channels: &[Channel]) -> Result<(), StoreError> {
        let mut conn = self.write_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.execute("DELETE FROM channels", [])
            .map_err(|e| StoreError::Database(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO channels ({}) VALUES (?, ?, ?, ?, ?, ?)",
                    CHANNEL_COLUMNS
                ))
                .map_err(|e| StoreError::Database(e.to_string()))?;

            for channel in channels {
                stmt.execute(params![
                    &channel.uuid,
                    channel.enabled.unwrap_or(true),
                    &channel.name,
                    channel.number,
                    &channel.icon,
                    &channel.icon_public_url,
                ])
                .map_err(|e| StoreError::Database(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!(count = channels.len(), "Replaced all channels");
        Ok(())
    }

    fn get_events_by_timerange(
        &self,
        start: i64,
        stop: i64,
        filter: &TimerangeFilter,
    ) -> Result<Vec<EpgEvent>, StoreError> {
        let conn = self.read_conn()?;

        let mut sql = format!(
            "SELECT {} FROM events WHERE start < ? AND stop > ?",
            EVENT_COLUMNS
        );
        let mut values = vec![Value::Integer(stop), Value::Integer(start)];

        if let Some(ref channel_uuid) = filter.channel_uuid {
            sql.push_str(" AND channel_uuid = ?");
            values.push(Value::Text(channel_uuid.clone()));
        }
        if let Some(content_type) = filter.content_type {
            sql.push_str(" AND content_type = ?");
            values.push(Value::Integer(content_type));
        }

        sql.push_str(" ORDER BY start ASC, event_id ASC");

        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit as i64));
        }

        Self::query_events(&conn, &sql, values)
    }

    fn get_event_by_id(&self, event_id: i64) -> Result<Option<EpgEvent>, StoreError> {
        let conn = self.read_conn()?;
        let sql = format!("SELECT {} FROM events WHERE event_id = ?", EVENT_COLUMNS);

        conn.query_row(&sql, params![event_id], Self::row_to_event)
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_events_by_ids(&self, event_ids: &[i64]) -> Result<Vec<EpgEvent>, StoreError> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.read_conn()?;
        let mut events = Vec::with_capacity(event_ids.len());

        for chunk in event_ids.chunks(ID_BATCH_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT {} FROM events WHERE event_id IN ({})",
                EVENT_COLUMNS, placeholders
            );
            let values = chunk.iter().map(|id| Value::Integer(*id)).collect();
            events.extend(Self::query_events(&conn, &sql, values)?);
        }

        Ok(events)
    }

    fn get_all_channels(&self) -> Result<Vec<CachedChannel>, StoreError> {
        let conn = self.read_conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM channels ORDER BY number IS NULL, number ASC, name ASC",
                CHANNEL_COLUMNS
            ))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_channel)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut channels = Vec::new();
        for row in rows {
            channels.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(channels)
    }

    fn get_channel_by_uuid_or_number(
        &self,
        identifier: &str,
    ) -> Result<Option<CachedChannel>, StoreError> {
        let conn = self.read_conn()?;

        match parse_channel_number(identifier) {
            Some(number) => Self::query_channel(&conn, "number", Value::Integer(number)),
            None => Self::query_channel(&conn, "uuid", Value::Text(identifier.to_string())),
        }
    }

    fn get_all_events_for_indexing(&self) -> Result<Vec<IndexableEvent>, StoreError> {
        let conn = self.read_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT event_id, title, subtitle, summary, description
                 FROM events ORDER BY event_id ASC",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(IndexableEvent {
                    event_id: row.get(0)?,
                    title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    subtitle: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    summary: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    description: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(events)
    }

    fn get_sync_meta(&self) -> Result<SyncMeta, StoreError> {
        let conn = self.read_conn()?;

        let (meta, status) = conn
            .query_row(
                "SELECT last_refresh_start, last_refresh_end, last_refresh_duration,
                        event_count, channel_count, status
                 FROM sync_meta WHERE id = 1",
                [],
                |row| {
                    let status: String = row.get(5)?;
                    Ok((
                        SyncMeta {
                            last_refresh_start: row.get(0)?,
                            last_refresh_end: row.get(1)?,
                            last_refresh_duration: row.get(2)?,
                            event_count: row.get(3)?,
                            channel_count: row.get(4)?,
                            status: SyncStatus::Idle,
                        },
                        status,
                    ))
                },
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(SyncMeta {
            status: status.parse()?,
            ..meta
        })
    }

    fn update_sync_status(&self, status: SyncStatus) -> Result<(), StoreError> {
        let conn = self.write_conn()?;

        let result = if status == SyncStatus::Refreshing {
            conn.execute(
                "UPDATE sync_meta SET status = ?, last_refresh_start = ? WHERE id = 1",
                params![status.as_str(), Utc::now().timestamp()],
            )
        } else {
            conn.execute(
                "UPDATE sync_meta SET status = ? WHERE id = 1",
                params![status.as_str()],
            )
        };

        result.map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn update_sync_complete(
        &self,
        event_count: u64,
        channel_count: u64,
    ) -> Result<(), StoreError> {
        let conn = self.write_conn()?;
        let now = Utc::now().timestamp();

        conn.execute(
            "UPDATE sync_meta SET
                status = 'idle',
                last_refresh_end = ?1,
                last_refresh_duration = ?1 - last_refresh_start,
                event_count = ?2,
                channel_count = ?3
             WHERE id = 1",
            params![now, event_count as i64, channel_count as i64],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_event_count(&self) -> Result<u64, StoreError> {
        let conn = self.read_conn()?;
        Self::count(&conn, "events")
    }

    fn get_channel_count(&self) -> Result<u64, StoreError> {
        let conn = self.read_conn()?;
        Self::count(&conn, "channels")
    }
}
