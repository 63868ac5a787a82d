use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};

use crate::{
    db::{helpers::to_u8, Database},
    models::{SceneTag, Segment},
};

pub(crate) fn upsert(conn: &Connection, filename: &str, segment: &Segment) -> Result<()> {
    conn.execute(
        "INSERT INTO segments (id, filename, start_time, end_time, tag, rating, description, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             start_time = excluded.start_time,
             end_time = excluded.end_time,
             tag = excluded.tag,
             rating = excluded.rating,
             description = excluded.description,
             updated_at = excluded.updated_at",
        params![
            segment.id,
            filename,
            segment.start_time,
            segment.end_time,
            segment.tag.as_str(),
            segment.rating,
            segment.description,
            Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("failed to upsert segment {}", segment.id))?;
    Ok(())
}

pub(crate) fn delete(conn: &Connection, filename: &str, id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM segments WHERE filename = ?1 AND id = ?2",
        params![filename, id],
    )
    .with_context(|| format!("failed to delete segment {id}"))?;
    Ok(())
}

pub(crate) fn list(conn: &Connection, filename: &str) -> Result<Vec<Segment>> {
    let mut stmt = conn.prepare(
        "SELECT id, start_time, end_time, tag, rating, description
         FROM segments
         WHERE filename = ?1
         ORDER BY start_time ASC",
    )?;

    let rows = stmt.query_map(params![filename], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    })?;

    let mut segments = Vec::new();
    for row in rows {
        let (id, start_time, end_time, tag, rating, description) = row?;
        segments.push(Segment {
            id,
            start_time,
            end_time,
            tag: tag.parse::<SceneTag>()?,
            rating: to_u8(rating, "rating")?,
            description,
        });
    }
    Ok(segments)
}

impl Database {
    /// Segments for one title, ordered by start time.
    pub async fn segments_for(&self, filename: &str) -> Result<Vec<Segment>> {
        let filename = filename.to_string();
        self.execute(move |conn| list(conn, &filename)).await
    }
}
