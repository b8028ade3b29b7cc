use crate::error::Result;
use crate::models::{Column, ListingRecord};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only tabular destination for listing records
pub trait Sink {
    /// Empty the table so the run starts from scratch
    fn reset(&mut self) -> Result<()>;

    /// Write the title row. Called at most once per run, before any data.
    fn write_header(&mut self, columns: &[Column]) -> Result<()>;

    fn append_rows(&mut self, columns: &[Column], records: &[ListingRecord]) -> Result<()>;
}

/// CSV file sink. Every write is flushed before returning, so rows written
/// before a failure stay on disk.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn appender(&self) -> Result<csv::Writer<File>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file))
    }
}

impl Sink for CsvSink {
    fn reset(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        File::create(&self.path)?;
        debug!("Truncated {}", self.path.display());
        Ok(())
    }

    fn write_header(&mut self, columns: &[Column]) -> Result<()> {
        let mut writer = self.appender()?;
        writer.write_record(columns.iter().map(|c| c.title()))?;
        writer.flush()?;
        Ok(())
    }

    fn append_rows(&mut self, columns: &[Column], records: &[ListingRecord]) -> Result<()> {
        let mut writer = self.appender()?;
        for record in records {
            writer.write_record(record.row(columns))?;
        }
        writer.flush()?;
        debug!("Appended {} rows to {}", records.len(), self.path.display());
        Ok(())
    }
}
