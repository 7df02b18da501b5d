//! ==============================================================================
//! storage - append-only sensor_data table
//! ==============================================================================
//!
//! purpose:
//!     owns the SQLite connection on a dedicated worker thread. async callers
//!     hand it closures and await the reply, so every request is one blocking
//!     call on the store and writes are serialized.
//!
//! relationships:
//!     - used by: api.rs (ingest + history handlers)
//!     - uses: migrations.rs (schema versioning via user_version)
//!
//! ==============================================================================

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, types::Type, Connection};
use serde_json::Value;
use tokio::sync::oneshot;

mod migrations;

use crate::domain::Reading;
use migrations::migrate;

/// number of readings the history query returns
pub const HISTORY_LIMIT: usize = 100;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// Coerces a raw json value the way a numeric column would.
fn numeric_column(value: &Value, column: &str) -> Result<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(anyhow!("invalid input for numeric column {column}: {value}")),
    }
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    /// Opens (creating if needed) the database file at `db_path`.
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let path_for_thread = db_path.clone();
        let database = Self::spawn(db_path, move || {
            let conn = Connection::open(&path_for_thread)?;
            if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                error!("Failed to enable WAL mode: {err}");
            }
            Ok(conn)
        })?;

        info!("Database initialized at {}", database.path().display());
        Ok(database)
    }

    /// Private in-memory database, gone when the last handle drops.
    pub fn open_in_memory() -> Result<Self> {
        Self::spawn(PathBuf::from(":memory:"), Connection::open_in_memory)
    }

    fn spawn<F>(db_path: PathBuf, open: F) -> Result<Self>
    where
        F: FnOnce() -> rusqlite::Result<Connection> + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("sensor-relay-db".into())
            .spawn(move || {
                let mut conn = match open() {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                let init_result = migrate(&mut conn)
                    .map(|_| ())
                    .context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .context("failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    /// Appends one reading; `created_at` is defaulted by the table.
    /// Returns the new row id.
    pub async fn insert_reading(&self, distance: Value, led_is_on: bool) -> Result<i64> {
        self.execute(move |conn| {
            let distance_cm = numeric_column(&distance, "distance_cm")?;
            conn.execute(
                "INSERT INTO sensor_data (distance_cm, led_is_on) VALUES (?1, ?2)",
                params![distance_cm, led_is_on],
            )
            .context("failed to insert reading")?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// The newest `limit` readings, returned oldest first.
    pub async fn recent_readings(&self, limit: usize) -> Result<Vec<Reading>> {
        let limit = i64::try_from(limit)
            .map_err(|_| anyhow!("limit {limit} exceeds SQLite INTEGER range"))?;

        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, distance_cm, led_is_on, created_at FROM (
                    SELECT id, distance_cm, led_is_on, created_at
                    FROM sensor_data
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?1
                )
                ORDER BY created_at ASC, id ASC",
            )?;

            let rows = stmt.query_map(params![limit], |row| {
                let created_at: String = row.get(3)?;
                let created_at = parse_datetime(&created_at)
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

                Ok(Reading {
                    id: row.get(0)?,
                    distance_cm: row.get(1)?,
                    led_is_on: row.get(2)?,
                    created_at,
                })
            })?;

            let mut readings = Vec::new();
            for reading in rows {
                readings.push(reading.context("failed to decode sensor_data row")?);
            }

            Ok(readings)
        })
        .await
    }

    pub async fn count_readings(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM sensor_data", [], |row| row.get(0))
                .context("failed to count readings")?;
            u64::try_from(count).map_err(|_| anyhow!("row count {count} is negative"))
        })
        .await
    }
}
