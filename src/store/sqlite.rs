use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};
use rust_decimal::Decimal;

use crate::app::{Result, StaywatchError};
use crate::domain::{DateRange, NormalizedRecord, RunRecord, RunSummary};
use crate::store::Store;

const UPSERT_PRICE: &str = "INSERT INTO prices (room_id, date_range, price, fee, total, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT(date_range, room_id) DO UPDATE SET
         price = excluded.price,
         fee = excluded.fee,
         total = excluded.total,
         updated_at = excluded.updated_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| StaywatchError::Other(format!("Migration failed: {}", e)))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            StaywatchError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn encode_decimal(value: Option<Decimal>) -> Option<String> {
        value.map(|d| d.to_string())
    }

    fn decode_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
        row.get::<_, Option<String>>(idx)?
            .map(|s| {
                Decimal::from_str(&s)
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
            })
            .transpose()
    }

    /// Lists are stored as JSON arrays; empty lists as NULL.
    fn encode_list<'a, I>(items: I) -> Result<Option<String>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let items: Vec<&String> = items.into_iter().collect();
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::to_string(&items)?))
    }

    fn decode_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
        match row.get::<_, Option<String>>(idx)? {
            Some(s) => serde_json::from_str(&s)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
            None => Ok(Vec::new()),
        }
    }

    fn price_from_row(row: &Row<'_>) -> rusqlite::Result<NormalizedRecord> {
        let date_range: String = row.get(1)?;
        Ok(NormalizedRecord {
            room_id: row.get(0)?,
            date_range: date_range
                .parse()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?,
            price: Self::decode_decimal(row, 2)?,
            fee: Self::decode_decimal(row, 3)?,
            total: Self::decode_decimal(row, 4)?,
        })
    }
}

impl Store for SqliteStore {
    fn add_room(&self, room_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO rooms (room_id, added_at) VALUES (?1, ?2)",
            params![room_id, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    fn remove_room(&self, room_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM rooms WHERE room_id = ?1", params![room_id])?;
        Ok(deleted > 0)
    }

    fn room_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT room_id FROM rooms ORDER BY room_id")?;

        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(ids)
    }

    fn upsert_price(&self, record: &NormalizedRecord) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            UPSERT_PRICE,
            params![
                record.room_id,
                record.date_range.to_string(),
                Self::encode_decimal(record.price),
                Self::encode_decimal(record.fee),
                Self::encode_decimal(record.total),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn upsert_prices(&self, records: &[NormalizedRecord]) -> Result<usize> {
        let mut conn = self.conn()?;

        let tx = conn.transaction()?;
        let mut count = 0;
        let now = Utc::now().to_rfc3339();

        {
            let mut stmt = tx.prepare(UPSERT_PRICE)?;
            for record in records {
                count += stmt.execute(params![
                    record.room_id,
                    record.date_range.to_string(),
                    Self::encode_decimal(record.price),
                    Self::encode_decimal(record.fee),
                    Self::encode_decimal(record.total),
                    now
                ])?;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    fn get_price(&self, room_id: &str, date_range: &DateRange) -> Result<Option<NormalizedRecord>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                "SELECT room_id, date_range, price, fee, total
                 FROM prices WHERE room_id = ?1 AND date_range = ?2",
                params![room_id, date_range.to_string()],
                Self::price_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn get_prices(&self, room_id: Option<&str>) -> Result<Vec<NormalizedRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT room_id, date_range, price, fee, total
             FROM prices WHERE ?1 IS NULL OR room_id = ?1
             ORDER BY room_id, date_range",
        )?;

        let records = stmt
            .query_map(params![room_id], Self::price_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn record_run(&self, summary: &RunSummary) -> Result<i64> {
        let room_ids = Self::encode_list(&summary.room_ids)?;
        let failed_room_ids = Self::encode_list(&summary.failed_room_ids)?;
        let error_messages = Self::encode_list(&summary.error_messages)?;
        let html_sidebar = Self::encode_list(&summary.html_sidebar)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO runs (room_ids, execution_time, successful_count, failed_count,
                               failed_room_ids, error_messages, html_sidebar, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                room_ids,
                summary.execution_time_display(),
                summary.successful_count as i64,
                summary.failed_count as i64,
                failed_room_ids,
                error_messages,
                html_sidebar,
                Utc::now().to_rfc3339()
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, room_ids, execution_time, successful_count, failed_count,
                    failed_room_ids, error_messages, html_sidebar, recorded_at
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let runs = stmt
            .query_map(params![limit as i64], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    room_ids: Self::decode_list(row, 1)?,
                    execution_time: row.get(2)?,
                    successful_count: row.get::<_, i64>(3)? as usize,
                    failed_count: row.get::<_, i64>(4)? as usize,
                    failed_room_ids: Self::decode_list(row, 5)?,
                    error_messages: Self::decode_list(row, 6)?,
                    html_sidebar: Self::decode_list(row, 7)?,
                    recorded_at: row
                        .get::<_, String>(8)
                        .ok()
                        .and_then(|s| Self::parse_datetime(&s))
                        .unwrap_or_else(Utc::now),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}
