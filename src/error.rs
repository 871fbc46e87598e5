/// Data-integrity errors raised while reading door history.
///
/// Any of these aborts the whole aggregation.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("event #{index} has a malformed `{field}` timestamp {value:?}: {source}")]
    MalformedTimestamp {
        index: usize,
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("unknown door status {0:?} (expected open, closed or unknown)")]
    UnknownStatus(String),
}
