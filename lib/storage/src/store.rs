use parking_lot::RwLock;
use schoolfinder_core::{
    CandidateFilters, CandidateSource, Error, Result, ReviewStats, SchoolId, SchoolRecord,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::snapshot::SnapshotFile;

/// In-memory school store
///
/// Records are kept in insertion order, which is the order search
/// candidates come back in. When opened on a snapshot file, every mutation
/// rewrites the file before the change becomes visible; if the write fails,
/// the store keeps its previous contents.
pub struct SchoolStore {
    schools: Arc<RwLock<Vec<SchoolRecord>>>,
    snapshot: Option<SnapshotFile>,
}

impl SchoolStore {
    pub fn in_memory() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn from_records(records: Vec<SchoolRecord>) -> Self {
        Self {
            schools: Arc::new(RwLock::new(records)),
            snapshot: None,
        }
    }

    /// Open a store backed by the snapshot at `path`, loading it if present.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let snapshot = SnapshotFile::new(path);
        let records = snapshot.load()?;
        info!(
            path = %snapshot.path().display(),
            schools = records.len(),
            "school snapshot loaded"
        );

        Ok(Self {
            schools: Arc::new(RwLock::new(records)),
            snapshot: Some(snapshot),
        })
    }

    pub fn len(&self) -> usize {
        self.schools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schools.read().is_empty()
    }

    /// Records passing `filters`, with offset then limit applied.
    pub fn list(&self, filters: &CandidateFilters) -> Vec<SchoolRecord> {
        self.schools
            .read()
            .iter()
            .filter(|s| filters.admits(s))
            .skip(filters.offset)
            .take(filters.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Number of records passing `filters`, ignoring paging.
    pub fn count(&self, filters: &CandidateFilters) -> usize {
        self.schools.read().iter().filter(|s| filters.admits(s)).count()
    }

    pub fn get(&self, id: SchoolId) -> Option<SchoolRecord> {
        self.schools.read().iter().find(|s| s.id == id).cloned()
    }

    /// Store `record` under the next free id (highest id + 1).
    pub fn insert(&self, mut record: SchoolRecord) -> Result<SchoolRecord> {
        let mut schools = self.schools.write();
        record.id = schools.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let mut next = schools.clone();
        next.push(record.clone());
        self.commit(&mut schools, next)?;
        debug!(id = record.id, "school created");
        Ok(record)
    }

    /// Create a school from a raw document; any `id` it carries is replaced.
    pub fn create(&self, document: Value) -> Result<SchoolRecord> {
        let Value::Object(mut fields) = document else {
            return Err(Error::Serialization("school document must be an object".into()));
        };
        fields.insert("id".into(), Value::from(0u64));
        let record: SchoolRecord = serde_json::from_value(Value::Object(fields))?;
        self.insert(record)
    }

    /// Overwrite top-level fields of a school with those in `patch`. The id
    /// never changes. Returns `None` for an unknown id.
    pub fn update(&self, id: SchoolId, patch: &Value) -> Result<Option<SchoolRecord>> {
        let Value::Object(changes) = patch else {
            return Err(Error::Serialization("school patch must be an object".into()));
        };

        let mut schools = self.schools.write();
        let Some(index) = schools.iter().position(|s| s.id == id) else {
            return Ok(None);
        };

        let mut document = serde_json::to_value(&schools[index])?;
        if let Value::Object(fields) = &mut document {
            for (key, value) in changes {
                if key != "id" {
                    fields.insert(key.clone(), value.clone());
                }
            }
        }
        let updated: SchoolRecord = serde_json::from_value(document)?;

        let mut next = schools.clone();
        next[index] = updated.clone();
        self.commit(&mut schools, next)?;
        Ok(Some(updated))
    }

    pub fn delete(&self, id: SchoolId) -> Result<bool> {
        let mut schools = self.schools.write();
        if !schools.iter().any(|s| s.id == id) {
            return Ok(false);
        }
        let next: Vec<SchoolRecord> = schools.iter().filter(|s| s.id != id).cloned().collect();
        self.commit(&mut schools, next)?;
        Ok(true)
    }

    /// Write a recomputed rating and review count onto a school.
    pub fn apply_review_stats(&self, id: SchoolId, stats: ReviewStats) -> Result<Option<SchoolRecord>> {
        let mut schools = self.schools.write();
        let Some(index) = schools.iter().position(|s| s.id == id) else {
            return Ok(None);
        };

        let mut next = schools.clone();
        next[index].rating = Some(stats.average_rating);
        next[index].review_count = stats.total_reviews;
        let updated = next[index].clone();

        self.commit(&mut schools, next)?;
        Ok(Some(updated))
    }

    /// Flush the current records to the snapshot file, if there is one.
    pub fn save(&self) -> Result<()> {
        let schools = self.schools.read();
        self.persist(&schools)
    }

    /// Write `next` to the snapshot, then install it. A failed write leaves
    /// `current` untouched.
    fn commit(&self, current: &mut Vec<SchoolRecord>, next: Vec<SchoolRecord>) -> Result<()> {
        self.persist(&next)?;
        *current = next;
        Ok(())
    }

    fn persist(&self, schools: &[SchoolRecord]) -> Result<()> {
        match &self.snapshot {
            Some(snapshot) => snapshot.write(schools),
            None => Ok(()),
        }
    }
}

impl CandidateSource for SchoolStore {
    async fn fetch_candidates(&self, filters: &CandidateFilters) -> Result<Vec<SchoolRecord>> {
        Ok(self.list(filters))
    }

    async fn fetch_school(&self, id: SchoolId) -> Result<Option<SchoolRecord>> {
        Ok(self.get(id))
    }
}
