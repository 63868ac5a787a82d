use std::sync::Mutex;

use anyhow::Result;

use super::{repositories, Database};
use crate::models::Record;

/// Where a session sends its records. `save` must not block the caller.
pub trait PersistenceSink: Send + Sync {
    fn save(&self, record: Record);

    /// Current segments, movie meta and activity logs for one title.
    fn load_by_filename(&self, filename: &str) -> Result<Vec<Record>>;
}

impl PersistenceSink for Database {
    fn save(&self, record: Record) {
        self.submit("save record", move |conn| match &record {
            Record::Segment { filename, segment } => {
                repositories::segments::upsert(conn, filename, segment)
            }
            Record::SegmentRemoved { filename, id } => {
                repositories::segments::delete(conn, filename, id)
            }
            Record::Movie(meta) => repositories::movies::upsert(conn, meta),
            Record::Activity(log) => repositories::activity::insert(conn, log),
        });
    }

    fn load_by_filename(&self, filename: &str) -> Result<Vec<Record>> {
        let filename = filename.to_string();
        self.execute_blocking(move |conn| {
            let mut records: Vec<Record> = repositories::segments::list(conn, &filename)?
                .into_iter()
                .map(|segment| Record::Segment {
                    filename: filename.clone(),
                    segment,
                })
                .collect();
            if let Some(meta) = repositories::movies::get(conn, &filename)? {
                records.push(Record::Movie(meta));
            }
            records.extend(
                repositories::activity::list(conn, &filename)?
                    .into_iter()
                    .map(Record::Activity),
            );
            Ok(records)
        })
    }
}

/// Keeps every record in memory. Loading folds the log into current state.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything saved so far, in order.
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl PersistenceSink for MemorySink {
    fn save(&self, record: Record) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    fn load_by_filename(&self, filename: &str) -> Result<Vec<Record>> {
        let mut segments: Vec<Record> = Vec::new();
        let mut movie = None;
        let mut activity = Vec::new();

        for record in self.records().into_iter().filter(|r| r.filename() == filename) {
            match record {
                Record::Segment { ref segment, .. } => {
                    let id = segment.id.clone();
                    segments.retain(|existing| !matches!(existing, Record::Segment { segment, .. } if segment.id == id));
                    segments.push(record);
                }
                Record::SegmentRemoved { id, .. } => {
                    segments.retain(|existing| !matches!(existing, Record::Segment { segment, .. } if segment.id == id));
                }
                Record::Movie(meta) => movie = Some(meta),
                Record::Activity(log) => activity.push(Record::Activity(log)),
            }
        }

        segments.extend(movie.map(Record::Movie));
        segments.extend(activity);
        Ok(segments)
    }
}
