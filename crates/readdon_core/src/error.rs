use std::fmt;

use thiserror::Error;

/// Coarse classification of an [`Error`], used by callers to pick a policy
/// (re-authenticate, skip the account, abort the run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Api,
    ManifestFetch,
    File,
    Network,
    Prompt,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => write!(f, "auth"),
            Self::Api => write!(f, "api"),
            Self::ManifestFetch => write!(f, "manifest"),
            Self::File => write!(f, "file"),
            Self::Network => write!(f, "network"),
            Self::Prompt => write!(f, "prompt"),
            Self::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("addon API error: {0}")]
    Api(String),

    #[error("failed to fetch manifest: {0}")]
    ManifestFetch(String),

    #[error("file error: {0}")]
    File(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authentication(_) => ErrorKind::Auth,
            Error::Api(_) => ErrorKind::Api,
            Error::ManifestFetch(_) => ErrorKind::ManifestFetch,
            Error::File(_) | Error::Io(_) => ErrorKind::File,
            Error::Network(_) => ErrorKind::Network,
            Error::Prompt(_) => ErrorKind::Prompt,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether a fresh login is worth attempting after this error.
    ///
    /// Stale tokens surface as API errors (the service answers with an error
    /// body) and occasionally as transport failures, so both qualify. Bad
    /// credentials and local file problems do not.
    pub fn warrants_reauthentication(&self) -> bool {
        matches!(self.kind(), ErrorKind::Api | ErrorKind::Network)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
