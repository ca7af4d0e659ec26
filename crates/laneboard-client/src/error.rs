use laneboard_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server understood the request and refused it.
    #[error("{message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response ({status}): {body}")]
    Unexpected { status: u16, body: String },
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Rejected { kind, .. } => *kind,
            ClientError::Transport(_) => ErrorKind::TransientIo,
            ClientError::Unexpected { status, .. } if *status >= 500 => ErrorKind::TransientIo,
            ClientError::Unexpected { .. } => ErrorKind::Internal,
        }
    }

    pub fn rejected(kind: ErrorKind, message: impl Into<String>) -> Self {
        ClientError::Rejected {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_keeps_server_kind() {
        let e = ClientError::rejected(ErrorKind::PermissionDenied, "not a member");
        assert_eq!(e.kind(), ErrorKind::PermissionDenied);
        assert_eq!(e.to_string(), "not a member");
    }

    #[test]
    fn unexpected_5xx_is_transient() {
        let e = ClientError::Unexpected {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(e.kind(), ErrorKind::TransientIo);
        let e = ClientError::Unexpected {
            status: 418,
            body: String::new(),
        };
        assert_eq!(e.kind(), ErrorKind::Internal);
    }
}
