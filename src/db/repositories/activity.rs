use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::{
    db::{
        helpers::{parse_datetime, to_u32},
        Database,
    },
    models::ActivityLog,
};

pub(crate) fn insert(conn: &Connection, log: &ActivityLog) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO activity_logs (id, filename, started_at, ended_at, watched_secs, segments_committed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            log.id,
            log.filename,
            log.started_at.to_rfc3339(),
            log.ended_at.to_rfc3339(),
            log.watched_secs,
            log.segments_committed,
        ],
    )
    .with_context(|| format!("failed to insert activity log {}", log.id))?;
    Ok(())
}

pub(crate) fn list(conn: &Connection, filename: &str) -> Result<Vec<ActivityLog>> {
    let mut stmt = conn.prepare(
        "SELECT id, started_at, ended_at, watched_secs, segments_committed
         FROM activity_logs
         WHERE filename = ?1
         ORDER BY started_at ASC",
    )?;

    let rows = stmt.query_map(params![filename], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, i64>(4)?,
        ))
    })?;

    let mut logs = Vec::new();
    for row in rows {
        let (id, started_at, ended_at, watched_secs, segments_committed) = row?;
        logs.push(ActivityLog {
            id,
            filename: filename.to_string(),
            started_at: parse_datetime(&started_at, "started_at")?,
            ended_at: parse_datetime(&ended_at, "ended_at")?,
            watched_secs,
            segments_committed: to_u32(segments_committed, "segments_committed")?,
        });
    }
    Ok(logs)
}

impl Database {
    pub async fn activity_for(&self, filename: &str) -> Result<Vec<ActivityLog>> {
        let filename = filename.to_string();
        self.execute(move |conn| list(conn, &filename)).await
    }
}
