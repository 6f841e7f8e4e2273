//! SQLite work-queue implementation

use crate::queue::schema::initialize_schema;
use crate::queue::traits::{QueueError, QueueResult, WorkQueue};
use crate::queue::{ItemStatus, QueueCounts, QueuedItem, RunRecord, RunStatus, WorkItem};
use crate::state::{Payload, Stage};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use url::Url;

/// SQLite-backed work queue
pub struct SqliteQueue {
    conn: Connection,
}

impl SqliteQueue {
    /// Opens or creates a queue database at the given path
    pub fn new(path: &Path) -> QueueResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory queue (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> QueueResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Marks a row failed and reports it as unroutable
    fn fail_corrupt(&mut self, id: i64, url: String, reason: String) -> QueueError {
        let now = Utc::now().to_rfc3339();
        let update = self.conn.execute(
            "UPDATE work_items SET status = ?1, settled_at = ?2 WHERE id = ?3",
            params![ItemStatus::Failed.to_db_string(), now, id],
        );
        if let Err(e) = update {
            tracing::error!("Failed to settle corrupt item {}: {}", id, e);
        }
        QueueError::CorruptItem { id, url, reason }
    }
}

impl WorkQueue for SqliteQueue {
    fn enqueue(&mut self, item: &WorkItem) -> QueueResult<bool> {
        let now = Utc::now().to_rfc3339();
        let payload = item.payload.to_json()?;
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO work_items (url, stage, payload, status, enqueued_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.url.as_str(),
                item.stage.as_label(),
                payload,
                ItemStatus::Pending.to_db_string(),
                now
            ],
        )?;
        Ok(changed > 0)
    }

    fn pop(&mut self) -> QueueResult<Option<QueuedItem>> {
        let row: Option<(i64, String, String, String, u32)> = self
            .conn
            .query_row(
                "SELECT id, url, stage, payload, retry_count FROM work_items
                 WHERE status = ?1 ORDER BY id ASC LIMIT 1",
                params![ItemStatus::Pending.to_db_string()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, url_str, stage_label, payload_json, retry_count)) = row else {
            return Ok(None);
        };

        let Some(stage) = Stage::from_label(&stage_label) else {
            return Err(self.fail_corrupt(
                id,
                url_str,
                format!("unknown stage label '{}'", stage_label),
            ));
        };

        let url = match Url::parse(&url_str) {
            Ok(url) => url,
            Err(e) => {
                return Err(self.fail_corrupt(id, url_str, format!("invalid URL: {}", e)));
            }
        };

        let payload = match Payload::from_json(&payload_json) {
            Ok(payload) => payload,
            Err(e) => {
                return Err(self.fail_corrupt(id, url_str, format!("invalid payload: {}", e)));
            }
        };

        self.conn.execute(
            "UPDATE work_items SET status = ?1 WHERE id = ?2",
            params![ItemStatus::InFlight.to_db_string(), id],
        )?;

        Ok(Some(QueuedItem {
            id,
            retry_count,
            item: WorkItem::new(url, stage, payload),
        }))
    }

    fn mark_done(&mut self, id: i64) -> QueueResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE work_items SET status = ?1, settled_at = ?2 WHERE id = ?3",
            params![ItemStatus::Done.to_db_string(), now, id],
        )?;
        Ok(())
    }

    fn requeue(&mut self, id: i64) -> QueueResult<u32> {
        self.conn.execute(
            "UPDATE work_items SET status = ?1, retry_count = retry_count + 1 WHERE id = ?2",
            params![ItemStatus::Pending.to_db_string(), id],
        )?;

        let retry_count: u32 = self.conn.query_row(
            "SELECT retry_count FROM work_items WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(retry_count)
    }

    fn mark_failed(&mut self, id: i64) -> QueueResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE work_items SET status = ?1, settled_at = ?2 WHERE id = ?3",
            params![ItemStatus::Failed.to_db_string(), now, id],
        )?;
        Ok(())
    }

    fn pending_count(&self) -> QueueResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM work_items WHERE status = ?1",
            params![ItemStatus::Pending.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn counts(&self) -> QueueResult<QueueCounts> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM work_items GROUP BY status")?;

        let mut counts = QueueCounts::default();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (status, count) = row?;
            match ItemStatus::from_db_string(&status) {
                Some(ItemStatus::Pending) => counts.pending = count as u64,
                Some(ItemStatus::InFlight) => counts.in_flight = count as u64,
                Some(ItemStatus::Done) => counts.done = count as u64,
                Some(ItemStatus::Failed) => counts.failed = count as u64,
                None => tracing::warn!("Unknown item status in queue: {}", status),
            }
        }

        Ok(counts)
    }

    fn reset_in_flight(&mut self) -> QueueResult<u64> {
        let changed = self.conn.execute(
            "UPDATE work_items SET status = ?1 WHERE status = ?2",
            params![
                ItemStatus::Pending.to_db_string(),
                ItemStatus::InFlight.to_db_string()
            ],
        )?;
        Ok(changed as u64)
    }

    fn clear(&mut self) -> QueueResult<()> {
        self.conn.execute("DELETE FROM work_items", [])?;
        Ok(())
    }

    // ===== Run Management =====

    fn create_run(&mut self, keyword: &str, config_hash: &str) -> QueueResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (keyword, config_hash, started_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![keyword, config_hash, now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(&mut self, run_id: i64) -> QueueResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        if changed == 0 {
            return Err(QueueError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn latest_run(&self) -> QueueResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, keyword, config_hash, started_at, finished_at, status
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        keyword: row.get(1)?,
                        config_hash: row.get(2)?,
                        started_at: row.get(3)?,
                        finished_at: row.get(4)?,
                        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
                            .unwrap_or(RunStatus::Running),
                    })
                },
            )
            .optional()?;

        Ok(run)
    }
}
