use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::{
    db::{helpers::parse_datetime, Database},
    models::MovieMeta,
};

pub(crate) fn upsert(conn: &Connection, meta: &MovieMeta) -> Result<()> {
    let heatmap = serde_json::to_string(&meta.heatmap)?;
    conn.execute(
        "INSERT INTO movie_meta (filename, duration_secs, last_played_at, heatmap)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(filename) DO UPDATE SET
             duration_secs = excluded.duration_secs,
             last_played_at = excluded.last_played_at,
             heatmap = excluded.heatmap",
        params![
            meta.filename,
            meta.duration_secs,
            meta.last_played_at.to_rfc3339(),
            heatmap,
        ],
    )
    .with_context(|| format!("failed to save movie meta for {}", meta.filename))?;
    Ok(())
}

pub(crate) fn get(conn: &Connection, filename: &str) -> Result<Option<MovieMeta>> {
    let row = conn
        .query_row(
            "SELECT duration_secs, last_played_at, heatmap FROM movie_meta WHERE filename = ?1",
            params![filename],
            |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((duration_secs, last_played_at, heatmap)) = row else {
        return Ok(None);
    };

    Ok(Some(MovieMeta {
        filename: filename.to_string(),
        duration_secs,
        last_played_at: parse_datetime(&last_played_at, "last_played_at")?,
        heatmap: serde_json::from_str(&heatmap).context("failed to decode heatmap")?,
    }))
}

impl Database {
    pub async fn movie_meta(&self, filename: &str) -> Result<Option<MovieMeta>> {
        let filename = filename.to_string();
        self.execute(move |conn| get(conn, &filename)).await
    }
}
