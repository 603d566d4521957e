use std::path::PathBuf;

use thiserror::Error;

pub type LoaderResult<T> = std::result::Result<T, LoaderError>;

/// Fatal failures. Row-level problems are logged and accumulated into the
/// result structures instead.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Input contains no lines")]
    EmptyInput,
    #[error("Header row has no field names")]
    NoHeaderFields,
    #[error("Reading input {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Decoding input {path:?} as {encoding}")]
    Decode { path: PathBuf, encoding: &'static str },
    #[error("Unknown encoding '{0}'")]
    UnknownEncoding(String),
    #[error("Bulk insert failed in chunk {chunk}; transaction rolled back")]
    BulkChunk {
        chunk: usize,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Transaction aborted while inserting '{identifier}'; nothing committed")]
    TransactionAborted {
        identifier: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error(transparent)]
    Document(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_message_appears_once_in_chain() {
        let err = LoaderError::Read {
            path: PathBuf::from("users.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone missing"),
        };
        assert!(!err.to_string().contains("gone missing"));
        let rendered = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(rendered.matches("gone missing").count(), 1, "{rendered}");
    }

    #[test]
    fn transparent_storage_error_is_not_repeated() {
        let err = LoaderError::from(rusqlite::Error::InvalidQuery);
        let message = err.to_string();
        let rendered = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(rendered, message);
    }
}
