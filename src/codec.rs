//! Response codecs.
//!
//! A [`Codec`] fixes three things for an endpoint: the only media type it
//! negotiates, how large a request body may be, and how a handler's result is
//! turned into response bytes.
//!
//! The serializer sees `Option<&T>`: it runs even when the handler failed and
//! produced no value, so every codec must have an answer for `None`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Body-size ceiling of the built-in codecs, in bytes.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1 << 10;

type SerializeFn<T> = dyn Fn(Option<&T>) -> Result<Vec<u8>, SerializationError> + Send + Sync;

/// Content type, body-size limit and serializer for one endpoint.
pub struct Codec<T> {
    accepts: String,
    max_body_bytes: u64,
    serialize: Arc<SerializeFn<T>>,
}

impl<T> Codec<T> {
    pub fn new<F>(accepts: impl Into<String>, max_body_bytes: u64, serialize: F) -> Self
    where
        F: Fn(Option<&T>) -> Result<Vec<u8>, SerializationError> + Send + Sync + 'static,
    {
        Self { accepts: accepts.into(), max_body_bytes, serialize: Arc::new(serialize) }
    }

    /// The media type the `Accept` header must equal, also sent back as `content-type`.
    pub fn accepts(&self) -> &str {
        &self.accepts
    }

    pub fn max_body_bytes(&self) -> u64 {
        self.max_body_bytes
    }

    /// Returns a copy with a different body-size limit.
    pub fn with_max_body_bytes(mut self, max_body_bytes: u64) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn serialize(&self, value: Option<&T>) -> Result<Vec<u8>, SerializationError> {
        (self.serialize)(value)
    }
}

impl<T: fmt::Debug> Codec<T> {
    /// `text/plain` codec rendering values with their `Debug` form.
    ///
    /// An absent value renders as an empty body, not as a placeholder word
    /// like `<nil>` or `None`. Never fails.
    pub fn text() -> Self {
        Self::new("text/plain", DEFAULT_MAX_BODY_BYTES, |value: Option<&T>| {
            Ok(value.map(|v| format!("{v:?}").into_bytes()).unwrap_or_default())
        })
    }
}

impl<T: Serialize> Codec<T> {
    /// `application/json` codec backed by `serde_json`. An absent value is `null`.
    pub fn json() -> Self {
        Self::new("application/json", DEFAULT_MAX_BODY_BYTES, |value: Option<&T>| {
            serde_json::to_vec(&value).map_err(SerializationError::new)
        })
    }
}

impl<T> Clone for Codec<T> {
    fn clone(&self) -> Self {
        Self {
            accepts: self.accepts.clone(),
            max_body_bytes: self.max_body_bytes,
            serialize: Arc::clone(&self.serialize),
        }
    }
}

impl<T> fmt::Debug for Codec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("accepts", &self.accepts)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

// ── SerializationError ────────────────────────────────────────────────────────

/// A handler result the codec could not encode.
#[derive(Debug)]
pub struct SerializationError(Box<dyn std::error::Error + Send + Sync>);

impl SerializationError {
    pub fn new(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(cause.into())
    }
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "serialization: {}", self.0)
    }
}

impl std::error::Error for SerializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.0)
    }
}
