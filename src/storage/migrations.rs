//! Schema versioning on SQLite's `user_version` pragma.
//!
//! `STEPS[i]` takes the schema from version `i` to `i + 1`, so the newest
//! version is `STEPS.len()`. Pending steps run inside one transaction.

use anyhow::{ensure, Context, Result};
use log::info;
use rusqlite::Connection;

const STEPS: &[&str] = &[include_str!("schemas/schema_v1.sql")];

pub fn latest_version() -> usize {
    STEPS.len()
}

fn user_version(conn: &Connection) -> Result<usize> {
    let raw: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version")?;
    usize::try_from(raw).with_context(|| format!("invalid user_version {}", raw))
}

/// Brings the schema up to `latest_version()`; returns how many steps ran.
pub fn migrate(conn: &mut Connection) -> Result<usize> {
    let current = user_version(conn)?;
    let latest = latest_version();
    ensure!(
        current <= latest,
        "database schema v{} is newer than this build understands (v{})",
        current,
        latest
    );

    let pending = &STEPS[current..];
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for (offset, sql) in pending.iter().enumerate() {
        tx.execute_batch(sql)
            .with_context(|| format!("schema step to v{} failed", current + offset + 1))?;
    }
    tx.pragma_update(None, "user_version", latest as i64)?;
    tx.commit()?;

    info!("Database schema migrated v{} -> v{}", current, latest);
    Ok(pending.len())
}
