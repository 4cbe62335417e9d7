use thiserror::Error;

/// Failures raised while turning one run's log files into a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("malformed filename {filename}: expected at least 4 '_' separated parts, found {parts}")]
    MalformedFilename { filename: String, parts: usize },

    #[error("invalid date {value:?} in filename {filename}")]
    InvalidDate { filename: String, value: String },

    #[error("cannot resolve package/task from {path}: {detail}")]
    PathResolutionError { path: String, detail: String },

    #[error("{source_id}: no line reports compilation time in seconds")]
    MetricNotFound { source_id: String },

    #[error("{source_id}: cannot parse {token:?} as seconds")]
    MetricUnparsable { source_id: String, token: String },

    #[error("{source_id}: empty content")]
    EmptyContent { source_id: String },

    #[error("{source_id}: no line ends with \" seconds\"")]
    NoTimingLine { source_id: String },

    #[error("{source_id}: timing line {line:?} has fewer than 2 fields")]
    MalformedTimingLine { source_id: String, line: String },

    #[error("{source_id}: cannot parse {field:?} as a number")]
    NumericParseError { source_id: String, field: String },

    #[error("read {path}: {message}")]
    FileAccessError { path: String, message: String },
}
