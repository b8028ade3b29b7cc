pub mod accumulator;
pub mod sink;

pub use accumulator::RecordAccumulator;
pub use sink::{CsvSink, Sink};
