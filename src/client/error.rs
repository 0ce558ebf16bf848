use thiserror::Error;

/// Failure of a call made by the aggregation core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected response: {0}")]
    Malformed(String),

    /// The service answered with `error: true` or a failing status
    #[error("{message}")]
    Declared { status: u16, message: String },

    /// The session token was rejected; the session has been cleared
    #[error("Session expired, please sign in again")]
    Unauthorized,
}

impl ClientError {
    /// Transport failures, timeouts and 5xx answers may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Timeout => true,
            ClientError::Declared { status, .. } => *status >= 500,
            ClientError::Malformed(_) | ClientError::Unauthorized => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Declared { status, .. } => Some(*status),
            ClientError::Unauthorized => Some(401),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Malformed(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::Timeout.is_transient());
        assert!(ClientError::Transport("refused".into()).is_transient());
        assert!(ClientError::Declared { status: 503, message: "down".into() }.is_transient());
        assert!(!ClientError::Declared { status: 404, message: "missing".into() }.is_transient());
        assert!(!ClientError::Unauthorized.is_transient());
        assert!(!ClientError::Malformed("bad json".into()).is_transient());
    }

    #[test]
    fn test_declared_displays_message() {
        let err = ClientError::Declared {
            status: 409,
            message: "Recipe is already bookmarked".into(),
        };
        assert_eq!(err.to_string(), "Recipe is already bookmarked");
        assert_eq!(err.status(), Some(409));
    }
}
