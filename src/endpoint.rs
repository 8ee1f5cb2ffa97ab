//! Endpoint configuration.
//!
//! An [`EndpointBuilder`] is the only mutable stage: set handlers, the codec,
//! status-table entries and loggers, then call [`EndpointBuilder::build`].
//! The resulting [`Endpoint`] has no setters. Once it is on a
//! [`Router`](crate::Router) it is shared read-only by every request.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::codec::Codec;
use crate::handler::{
    BoxedCollection, BoxedItem, CollectionHandler, ItemHandler, unimplemented_collection,
    unimplemented_item,
};
use crate::logger::{Logger, LoggerSource, TracingLogger};
use crate::request::Request;
use crate::status::{ErrorKind, StatusTable};

/// The frozen configuration of one named resource.
pub struct Endpoint<T> {
    pub(crate) name: String,

    pub(crate) get_collection: BoxedCollection<T>,
    pub(crate) post_collection: BoxedCollection<T>,

    pub(crate) head: BoxedItem<T>,
    pub(crate) get: BoxedItem<T>,
    pub(crate) put: BoxedItem<T>,
    pub(crate) post: BoxedItem<T>,
    pub(crate) delete: BoxedItem<T>,

    pub(crate) codec: Codec<T>,
    pub(crate) status_table: StatusTable,
    pub(crate) logger: LoggerSource,
}

impl<T: Send + 'static> Endpoint<T> {
    /// Starts configuring an endpoint serving `/{name}` and `/{name}/{id}`.
    ///
    /// Every handler slot starts as a stub answering 501, the status table
    /// maps `NotFound` to 404, and events go to a [`TracingLogger`].
    pub fn builder(name: impl Into<String>, codec: Codec<T>) -> EndpointBuilder<T> {
        let name = name.into();
        let logger = LoggerSource::Fixed(Arc::new(TracingLogger::new(name.clone())));
        EndpointBuilder {
            endpoint: Endpoint {
                name,
                get_collection: unimplemented_collection::<T>.into_boxed_collection(),
                post_collection: unimplemented_collection::<T>.into_boxed_collection(),
                head: unimplemented_item::<T>.into_boxed_item(),
                get: unimplemented_item::<T>.into_boxed_item(),
                put: unimplemented_item::<T>.into_boxed_item(),
                post: unimplemented_item::<T>.into_boxed_item(),
                delete: unimplemented_item::<T>.into_boxed_item(),
                codec,
                status_table: StatusTable::default(),
                logger,
            },
        }
    }
}

impl<T> Endpoint<T> {
    pub fn name(&self) -> &str { &self.name }
    pub fn codec(&self) -> &Codec<T> { &self.codec }
    pub fn status_table(&self) -> &StatusTable { &self.status_table }
}

impl<T> fmt::Debug for Endpoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("codec", &self.codec)
            .field("status_table", &self.status_table)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

// ── EndpointBuilder ───────────────────────────────────────────────────────────

/// Mutable stage of an [`Endpoint`]. Each setter returns `self` for chaining.
///
/// ```rust
/// use bytes::Bytes;
/// use http::StatusCode;
/// use restpoint::{Codec, Endpoint, ErrorKind, HandlerError, Request, Sentinel};
///
/// async fn get_widget(_req: Request, id: String, _body: Bytes) -> Result<String, HandlerError> {
///     if id == "42" { Ok("sprocket".to_owned()) } else { Err(HandlerError::not_found()) }
/// }
///
/// let locked = Sentinel::new("widget locked");
/// let widgets = Endpoint::builder("widgets", Codec::text())
///     .get(get_widget)
///     .status(ErrorKind::Custom(locked), StatusCode::LOCKED)
///     .build();
///
/// assert_eq!(widgets.status_table().get(ErrorKind::Custom(locked)), Some(StatusCode::LOCKED));
/// ```
pub struct EndpointBuilder<T> {
    endpoint: Endpoint<T>,
}

impl<T: Send + 'static> EndpointBuilder<T> {
    /// `GET /{name}`.
    pub fn get_collection(mut self, handler: impl CollectionHandler<T>) -> Self {
        self.endpoint.get_collection = handler.into_boxed_collection();
        self
    }

    /// `POST /{name}`.
    pub fn post_collection(mut self, handler: impl CollectionHandler<T>) -> Self {
        self.endpoint.post_collection = handler.into_boxed_collection();
        self
    }

    /// `HEAD /{name}/{id}`.
    pub fn head(mut self, handler: impl ItemHandler<T>) -> Self {
        self.endpoint.head = handler.into_boxed_item();
        self
    }

    /// `GET /{name}/{id}`.
    pub fn get(mut self, handler: impl ItemHandler<T>) -> Self {
        self.endpoint.get = handler.into_boxed_item();
        self
    }

    /// `PUT /{name}/{id}`.
    pub fn put(mut self, handler: impl ItemHandler<T>) -> Self {
        self.endpoint.put = handler.into_boxed_item();
        self
    }

    /// `POST /{name}/{id}`.
    pub fn post(mut self, handler: impl ItemHandler<T>) -> Self {
        self.endpoint.post = handler.into_boxed_item();
        self
    }

    /// `DELETE /{name}/{id}`.
    pub fn delete(mut self, handler: impl ItemHandler<T>) -> Self {
        self.endpoint.delete = handler.into_boxed_item();
        self
    }
}

impl<T> EndpointBuilder<T> {
    pub fn codec(mut self, codec: Codec<T>) -> Self {
        self.endpoint.codec = codec;
        self
    }

    /// Adds or overrides one status-table entry.
    pub fn status(mut self, kind: ErrorKind, status: StatusCode) -> Self {
        self.endpoint.status_table.insert(kind, status);
        self
    }

    pub fn without_status(mut self, kind: ErrorKind) -> Self {
        self.endpoint.status_table.remove(kind);
        self
    }

    /// Replaces the whole status table, default entry included.
    pub fn status_table(mut self, table: StatusTable) -> Self {
        self.endpoint.status_table = table;
        self
    }

    /// Logger shared by every request.
    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.endpoint.logger = LoggerSource::Fixed(Arc::new(logger));
        self
    }

    /// Derive a logger from each request. Takes precedence over [`logger`](Self::logger).
    pub fn request_logger<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Request) -> Arc<dyn Logger> + Send + Sync + 'static,
    {
        self.endpoint.logger = LoggerSource::PerRequest(Arc::new(factory));
        self
    }

    /// Freezes the configuration.
    pub fn build(self) -> Endpoint<T> {
        self.endpoint
    }
}
