//! CSV file sink: one `<name>.csv` per relation, UTF-8 with a BOM.

use crate::domain::error::ReconError;
use crate::ports::sink_port::SinkPort;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub struct CsvSinkAdapter {
    dir: PathBuf,
}

impl CsvSinkAdapter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }
}

fn write_error(path: &std::path::Path, e: impl std::fmt::Display) -> ReconError {
    ReconError::Io(std::io::Error::other(format!(
        "failed to write {}: {e}",
        path.display()
    )))
}

impl SinkPort for CsvSinkAdapter {
    fn write_table(
        &self,
        name: &str,
        columns: &[&str],
        rows: &[Vec<String>],
    ) -> Result<PathBuf, ReconError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);

        let mut file = File::create(&path)?;
        file.write_all(UTF8_BOM)?;

        let mut wtr = csv::Writer::from_writer(file);
        wtr.write_record(columns).map_err(|e| write_error(&path, e))?;
        for row in rows {
            wtr.write_record(row).map_err(|e| write_error(&path, e))?;
        }
        wtr.flush()?;

        info!(path = %path.display(), rows = rows.len(), "wrote {name}");
        Ok(path)
    }
}
