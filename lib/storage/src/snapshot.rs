// JSON snapshot file holding every school document
use atomicwrites::{AtomicFile, OverwriteBehavior};
use schoolfinder_core::{Error, Result, SchoolRecord};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A snapshot is a JSON array of school documents, rewritten whole on every
/// save. Writes go through a temp file and rename, so a reader never sees a
/// half-written array.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all records. A missing file is an empty snapshot.
    pub fn load(&self) -> Result<Vec<SchoolRecord>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)?;
        let records: Vec<SchoolRecord> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Persistence(format!("{}: {}", self.path.display(), e)))?;
        Ok(records)
    }

    pub fn write(&self, records: &[SchoolRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite)
            .write(|f| -> io::Result<()> {
                let mut writer = BufWriter::new(f);
                serde_json::to_writer_pretty(&mut writer, records).map_err(io::Error::from)?;
                writer.flush()
            })
            .map_err(|e| Error::Persistence(format!("{}: {}", self.path.display(), e)))
    }
}
