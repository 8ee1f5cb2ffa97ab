//! Unified error type.

use std::fmt;

/// The error type returned by restpoint's fallible operations.
///
/// Application-level failures (a missing record, an unimplemented verb) are
/// expressed as [`HandlerError`](crate::HandlerError) values and translated
/// into status codes. This type surfaces infrastructure failures: binding to
/// a port, accepting a connection, or registering an unusable route.
#[derive(Debug)]
pub enum Error {
    /// Socket-level failure while binding or serving.
    Io(std::io::Error),
    /// The bind address is not a valid `host:port` string.
    InvalidAddress(String),
    /// The endpoint name cannot be turned into a route.
    InvalidRoute {
        path: String,
        source: matchit::InsertError,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::InvalidAddress(addr) => write!(f, "invalid socket address `{addr}`"),
            Self::InvalidRoute { path, source } => write!(f, "invalid route `{path}`: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::InvalidAddress(_) => None,
            Self::InvalidRoute { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
