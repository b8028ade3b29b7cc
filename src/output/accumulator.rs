use crate::error::Result;
use crate::models::{Column, ListingRecord, ParsedListing};
use crate::output::Sink;
use tracing::{debug, info};

/// Stamps parsed listings with run-scoped IDs and flushes them to a sink.
///
/// IDs start at 1 and grow by one per record for the lifetime of the
/// accumulator. The sink is reset and given its header by `begin`, which
/// `flush` and `finish` also call if the run never did.
pub struct RecordAccumulator<S: Sink> {
    sink: S,
    columns: Vec<Column>,
    next_id: u64,
    started: bool,
}

impl<S: Sink> RecordAccumulator<S> {
    pub fn new(sink: S, columns: Vec<Column>) -> Self {
        Self {
            sink,
            columns,
            next_id: 1,
            started: false,
        }
    }

    /// Number of records flushed so far
    pub fn records_written(&self) -> u64 {
        self.next_id - 1
    }

    /// Assign IDs to `batch`, append it to the sink and return the stamped records
    pub fn flush(&mut self, batch: Vec<ParsedListing>) -> Result<Vec<ListingRecord>> {
        self.begin()?;

        let records: Vec<ListingRecord> = batch
            .into_iter()
            .map(|listing| {
                let record = ListingRecord::new(self.next_id, listing);
                self.next_id += 1;
                record
            })
            .collect();

        self.sink.append_rows(&self.columns, &records)?;
        if let (Some(first), Some(last)) = (records.first(), records.last()) {
            debug!(
                "Flushed records {}..={} (total {})",
                first.id(),
                last.id(),
                self.records_written()
            );
        }
        Ok(records)
    }

    /// End the run and hand back the sink.
    ///
    /// A run that never flushed still leaves a header-only table behind.
    pub fn finish(mut self) -> Result<S> {
        self.begin()?;
        info!("Run finished with {} records", self.records_written());
        Ok(self.sink)
    }

    /// Truncate the sink and write the header. Later calls do nothing.
    pub fn begin(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.sink.reset()?;
        self.sink.write_header(&self.columns)?;
        self.started = true;
        Ok(())
    }
}
