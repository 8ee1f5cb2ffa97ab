//! # restpoint
//!
//! A minimal framework that turns one named resource into a REST endpoint.
//!
//! Give it a name and it answers two path shapes:
//!
//! - `/{name}`: the collection. `GET` and `POST`.
//! - `/{name}/{id}`: one item, `id` matching `[A-Za-z0-9-]+`. `HEAD`, `GET`,
//!   `POST`, `PUT` and `DELETE`.
//!
//! Each verb is a handler slot. Slots you leave alone answer
//! `501 Not Implemented`. Requests whose `Accept` header is not exactly the
//! codec's media type get `406`; verbs outside a shape's set get `405`;
//! bodies declared larger than the codec allows get `413` unread.
//!
//! Handlers return a value and, optionally, an error. The value is always
//! serialized by the codec. The error picks the status: none is `200`,
//! [`ErrorKind::NotImplemented`] is `501`, anything else is looked up in the
//! endpoint's [`StatusTable`] (default: `NotFound → 404`), falling back to
//! `500`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use restpoint::{Codec, Endpoint, HandlerError, Request, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), restpoint::Error> {
//!     let widgets = Endpoint::builder("widgets", Codec::json())
//!         .get(get_widget)
//!         .build();
//!
//!     let router = Router::new().endpoint(widgets)?;
//!     Server::bind("0.0.0.0:3000")?.serve(router).await
//! }
//!
//! async fn get_widget(_req: Request, id: String, _body: Bytes) -> Result<String, HandlerError> {
//!     match id.as_str() {
//!         "42" => Ok("sprocket".to_owned()),
//!         _ => Err(HandlerError::not_found()),
//!     }
//! }
//! ```

mod codec;
mod dispatch;
mod endpoint;
mod error;
mod handler;
mod logger;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod json;
pub mod text;

pub use codec::{Codec, DEFAULT_MAX_BODY_BYTES, SerializationError};
pub use endpoint::{Endpoint, EndpointBuilder};
pub use error::Error;
pub use handler::{
    CollectionHandler, IntoReply, ItemHandler, Reply, unimplemented_collection, unimplemented_item,
};
pub use logger::{Logger, LoggerSource, TracingLogger};
pub use request::Request;
pub use response::{HANDLED_BY, HANDLED_BY_HEADER, Response};
pub use router::Router;
pub use server::Server;
pub use status::{ErrorKind, HandlerError, Sentinel, StatusTable};
