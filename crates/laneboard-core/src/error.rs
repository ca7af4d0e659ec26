use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("not initialized: run 'laneboard init'")]
    NotInitialized,

    #[error("board not found: {0}")]
    BoardNotFound(String),

    #[error("lane not found: {0}")]
    LaneNotFound(String),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("board already exists: {0}")]
    BoardExists(String),

    #[error("item already exists: {0}")]
    ItemExists(String),

    #[error("invalid id '{0}': must be lowercase alphanumeric with '-' or '_'")]
    InvalidId(String),

    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error("invalid lane category: {0}")]
    InvalidCategory(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("inconsistent lane order in '{lane}': {detail}")]
    Inconsistent { lane: String, detail: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;

impl BoardError {
    /// Coarse classification shared with clients over the wire.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BoardError::InvalidId(_)
            | BoardError::InvalidMove(_)
            | BoardError::InvalidCategory(_) => ErrorKind::Validation,
            BoardError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            BoardError::BoardNotFound(_)
            | BoardError::LaneNotFound(_)
            | BoardError::ItemNotFound(_) => ErrorKind::NotFound,
            BoardError::Storage(_) | BoardError::Io(_) => ErrorKind::TransientIo,
            BoardError::NotInitialized
            | BoardError::BoardExists(_)
            | BoardError::ItemExists(_)
            | BoardError::Inconsistent { .. }
            | BoardError::Yaml(_)
            | BoardError::Json(_) => ErrorKind::Internal,
        }
    }
}

/// Map any storage-engine error into [`BoardError::Storage`].
pub(crate) fn storage<E: fmt::Display>(e: E) -> BoardError {
    BoardError::Storage(e.to_string())
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    PermissionDenied,
    NotFound,
    TransientIo,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::NotFound => "not_found",
            ErrorKind::TransientIo => "transient_io",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_share_a_kind() {
        assert_eq!(BoardError::LaneNotFound("l".into()).kind(), ErrorKind::NotFound);
        assert_eq!(BoardError::ItemNotFound("i".into()).kind(), ErrorKind::NotFound);
        assert_eq!(BoardError::BoardNotFound("b".into()).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn storage_failures_are_transient() {
        assert_eq!(storage("disk full").kind(), ErrorKind::TransientIo);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::PermissionDenied).unwrap();
        assert_eq!(json, "\"permission_denied\"");
    }
}
