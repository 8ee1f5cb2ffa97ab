//! Error kinds and the error-to-status table.
//!
//! Handlers fail with a [`HandlerError`]. Its [`ErrorKind`] is the only thing
//! the dispatcher looks at when picking a status code: message text never
//! participates in the lookup.
//!
//! ```rust
//! use std::sync::LazyLock;
//! use http::StatusCode;
//! use restpoint::{ErrorKind, Sentinel, StatusTable};
//!
//! static BUSY: LazyLock<Sentinel> = LazyLock::new(|| Sentinel::new("backend busy"));
//!
//! let mut table = StatusTable::default();
//! table.insert(ErrorKind::Custom(*BUSY), StatusCode::SERVICE_UNAVAILABLE);
//!
//! assert_eq!(table.get(ErrorKind::NotFound), Some(StatusCode::NOT_FOUND));
//! assert_eq!(table.get(ErrorKind::Custom(*BUSY)), Some(StatusCode::SERVICE_UNAVAILABLE));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use http::StatusCode;

// ── Sentinel ──────────────────────────────────────────────────────────────────

/// A caller-defined error identity.
///
/// Every call to [`Sentinel::new`] mints a fresh identity. Two sentinels
/// created with the same name are still different keys.
#[derive(Clone, Copy, Debug)]
pub struct Sentinel {
    id: u64,
    name: &'static str,
}

impl Sentinel {
    pub fn new(name: &'static str) -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self { id: NEXT.fetch_add(1, Ordering::Relaxed), name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Sentinel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sentinel {}

impl Hash for Sentinel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// ── ErrorKind ─────────────────────────────────────────────────────────────────

/// The identity of a handler failure.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// What every unconfigured handler slot returns. Always answered with 501.
    NotImplemented,
    /// Mapped to 404 by the default status table.
    NotFound,
    Custom(Sentinel),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotImplemented => f.write_str("method not implemented"),
            Self::NotFound => f.write_str("not found"),
            Self::Custom(s) => f.write_str(s.name),
        }
    }
}

// ── HandlerError ──────────────────────────────────────────────────────────────

/// An application-level failure reported by a handler.
#[derive(Debug)]
pub struct HandlerError {
    kind: ErrorKind,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HandlerError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn not_implemented() -> Self {
        Self::new(ErrorKind::NotImplemented)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Attaches the underlying cause. It shows up in logs, never in the lookup.
    pub fn with_source(mut self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<ErrorKind> for HandlerError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<Sentinel> for HandlerError {
    fn from(sentinel: Sentinel) -> Self {
        Self::new(ErrorKind::Custom(sentinel))
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ── StatusTable ───────────────────────────────────────────────────────────────

/// Maps error kinds to the status code sent when a handler fails with them.
///
/// Consulted only for kinds other than [`ErrorKind::NotImplemented`]; kinds
/// missing from the table are answered with 500. The default table holds a
/// single entry, `NotFound → 404`.
#[derive(Clone, Debug)]
pub struct StatusTable {
    entries: HashMap<ErrorKind, StatusCode>,
}

impl StatusTable {
    /// A table with no entries at all.
    pub fn empty() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Adds or overrides a mapping.
    pub fn insert(&mut self, kind: ErrorKind, status: StatusCode) -> Option<StatusCode> {
        self.entries.insert(kind, status)
    }

    pub fn remove(&mut self, kind: ErrorKind) -> Option<StatusCode> {
        self.entries.remove(&kind)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, kind: ErrorKind) -> Option<StatusCode> {
        self.entries.get(&kind).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert(ErrorKind::NotFound, StatusCode::NOT_FOUND);
        table
    }
}
