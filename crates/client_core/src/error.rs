use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service answered with a non-2xx status.
    Status,
    /// The request never produced a response.
    Transport,
    /// The response body did not have the expected shape.
    Decode,
}

#[derive(Debug, Clone, Error)]
pub enum RecordServiceError {
    #[error(
        "{operation}: record service responded with status {status}{}",
        detail_suffix(.message)
    )]
    Status {
        operation: &'static str,
        status: u16,
        message: Option<String>,
    },
    #[error("{operation}: failed to reach record service: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    #[error("{operation}: malformed response from record service: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

impl RecordServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordServiceError::Status { .. } => ErrorKind::Status,
            RecordServiceError::Transport { .. } => ErrorKind::Transport,
            RecordServiceError::Decode { .. } => ErrorKind::Decode,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RecordServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            RecordServiceError::Status { operation, .. }
            | RecordServiceError::Transport { operation, .. }
            | RecordServiceError::Decode { operation, .. } => operation,
        }
    }

    pub(crate) fn from_reqwest(operation: &'static str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            RecordServiceError::Decode {
                operation,
                message: err.to_string(),
            }
        } else {
            RecordServiceError::Transport {
                operation,
                message: err.to_string(),
            }
        }
    }
}

fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" ({m})"))
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid record service url '{raw}': {source}")]
    InvalidUrl {
        raw: String,
        source: url::ParseError,
    },
    #[error("record service url '{raw}' must use http or https, not '{scheme}'")]
    UnsupportedScheme { raw: String, scheme: String },
    #[error("record service url '{raw}' must not carry a query or fragment")]
    UnexpectedSuffix { raw: String },
}
