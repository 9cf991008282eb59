use thiserror::Error;

/// Why a row could not be turned back into an entity.
///
/// Decoding is all-or-nothing: the first failing field aborts the row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("column `{column}`: `{value}` is not an integer")]
    InvalidInteger { column: &'static str, value: String },

    #[error("column `{column}`: `{value}` is not one of the known labels")]
    InvalidLabel { column: &'static str, value: String },

    #[error("column `{column}`: `{value}` is not a timestamp (expected YYYY-MM-DDTHH:MM:SS)")]
    InvalidTimestamp { column: &'static str, value: String },

    #[error("line is not valid UTF-8")]
    InvalidEncoding,
}

#[derive(Error, Debug)]
pub enum CarefileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown column `{column}` in {collection}")]
    UnknownColumn { collection: String, column: String },

    #[error("No record found in {collection} with id `{id}`")]
    NotFound { collection: String, id: String },

    #[error("A record with id `{id}` already exists in {collection}")]
    DuplicateId { collection: String, id: String },

    #[error("Malformed row in {collection}: {source}")]
    Decode {
        collection: String,
        #[source]
        source: DecodeError,
    },

    #[error("{owner} references missing {kind} `{id}`")]
    MissingReference {
        owner: String,
        kind: &'static str,
        id: String,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, CarefileError>;
