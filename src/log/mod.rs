//! Raw load-generator logs and cleaned latency artifacts.

pub mod parse;
pub mod row;

pub use parse::{parse_raw_log, read_cleaned, write_cleaned};
pub use row::{CleanedRecord, RawRecord};
