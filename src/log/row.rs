/// One request sample from a raw load-generator log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRecord {
    /// Request start, in whole seconds.
    pub timestamp: i64,
    /// Total request time.
    pub duration: f64,
}

/// A sample that survived outlier filtering. Field order matches the
/// cleaned artifact columns (`duration<TAB>timestamp`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanedRecord {
    pub duration: f64,
    pub timestamp: i64,
}

impl From<RawRecord> for CleanedRecord {
    fn from(r: RawRecord) -> Self {
        Self {
            duration: r.duration,
            timestamp: r.timestamp,
        }
    }
}

impl From<CleanedRecord> for RawRecord {
    fn from(r: CleanedRecord) -> Self {
        Self {
            timestamp: r.timestamp,
            duration: r.duration,
        }
    }
}
