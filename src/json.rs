//! JSON endpoints.
//!
//! ```rust
//! use bytes::Bytes;
//! use restpoint::{HandlerError, Request, json};
//!
//! async fn get_count(_req: Request, id: String, _body: Bytes) -> Result<usize, HandlerError> {
//!     Ok(id.len())
//! }
//!
//! let counts = json::endpoint("counts").get(get_count).build();
//! assert_eq!(counts.codec().accepts(), "application/json");
//! ```

use serde::Serialize;

use crate::codec::Codec;
use crate::endpoint::EndpointBuilder;
use crate::Endpoint;

/// Starts an `application/json` endpoint backed by `serde_json`: 1 KiB body
/// limit, `NotFound → 404`, every handler slot answering 501 until set.
pub fn endpoint<T>(name: impl Into<String>) -> EndpointBuilder<T>
where
    T: Serialize + Send + 'static,
{
    Endpoint::builder(name, Codec::json())
}

/// Decodes a request body, mapping malformed input to `error`.
///
/// Handlers usually pair this with a caller-defined [`Sentinel`](crate::Sentinel)
/// mapped to `400 Bad Request` in the endpoint's status table.
pub fn decode<'de, V>(body: &'de [u8], error: crate::ErrorKind) -> Result<V, crate::HandlerError>
where
    V: serde::Deserialize<'de>,
{
    serde_json::from_slice(body).map_err(|e| crate::HandlerError::new(error).with_source(e))
}
