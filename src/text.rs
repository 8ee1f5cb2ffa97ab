//! Plain-text endpoints.
//!
//! Values are rendered with their `Debug` form under `text/plain`. Handy for
//! prototypes and for endpoints that only ever answer with status codes.

use std::fmt;

use crate::codec::Codec;
use crate::endpoint::EndpointBuilder;
use crate::Endpoint;

/// Starts a `text/plain` endpoint: 1 KiB body limit, `NotFound → 404`,
/// every handler slot answering 501 until set.
pub fn endpoint<T>(name: impl Into<String>) -> EndpointBuilder<T>
where
    T: fmt::Debug + Send + 'static,
{
    Endpoint::builder(name, Codec::text())
}
