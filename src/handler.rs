//! Handler traits, replies and type erasure.
//!
//! An endpoint holds seven handler slots of two shapes:
//!
//! ```text
//! async fn collection(req: Request, body: Bytes)             -> impl IntoReply<T>
//! async fn item      (req: Request, id: String, body: Bytes) -> impl IntoReply<T>
//! ```
//!
//! # How handlers are stored
//!
//! Each slot holds a different closure type, so slots store trait objects:
//!
//! ```text
//! async fn get_widget(req, id, body) -> Result<Widget, HandlerError>   ← user writes this
//!        ↓ builder.get(get_widget)
//! get_widget.into_boxed_item()                                          ← blanket impl
//!        ↓
//! Arc::new(FnItem(get_widget))   stored as BoxedItem<Widget>
//!        ↓
//! handler.call(req, id, body)  at request time                          ← one vtable dispatch
//!        ↓
//! Box::pin(async { get_widget(..).await.into_reply() })                 ← BoxFuture<Reply<Widget>>
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;

use crate::request::Request;
use crate::status::{ErrorKind, HandlerError};

// ── Reply ─────────────────────────────────────────────────────────────────────

/// What a handler produced: an optional value and an optional error.
///
/// Both halves are independent. The value is serialized whatever the error
/// is; the error alone decides the status code.
#[derive(Debug)]
pub struct Reply<T> {
    pub value: Option<T>,
    pub error: Option<HandlerError>,
}

impl<T> Reply<T> {
    /// A value and no error: `200 OK`.
    pub fn ok(value: T) -> Self {
        Self { value: Some(value), error: None }
    }

    /// An error and no value.
    pub fn err(error: impl Into<HandlerError>) -> Self {
        Self { value: None, error: Some(error.into()) }
    }

    /// A value that still goes out as the body of an error response.
    pub fn with_error(value: T, error: impl Into<HandlerError>) -> Self {
        Self { value: Some(value), error: Some(error.into()) }
    }

    pub fn not_implemented() -> Self {
        Self::err(ErrorKind::NotImplemented)
    }
}

/// Conversion into a [`Reply`]. Lets handlers return `Result<T, HandlerError>`.
pub trait IntoReply<T> {
    fn into_reply(self) -> Reply<T>;
}

impl<T> IntoReply<T> for Reply<T> {
    fn into_reply(self) -> Reply<T> { self }
}

impl<T> IntoReply<T> for Result<T, HandlerError> {
    fn into_reply(self) -> Reply<T> {
        match self {
            Ok(value) => Reply::ok(value),
            Err(error) => Reply::err(error),
        }
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = Reply<T>> + Send + 'static>>;

#[doc(hidden)]
pub trait ErasedCollection<T> {
    fn call(&self, req: Request, body: Bytes) -> BoxFuture<T>;
}

#[doc(hidden)]
pub trait ErasedItem<T> {
    fn call(&self, req: Request, id: String, body: Bytes) -> BoxFuture<T>;
}

#[doc(hidden)]
pub type BoxedCollection<T> = Arc<dyn ErasedCollection<T> + Send + Sync + 'static>;

#[doc(hidden)]
pub type BoxedItem<T> = Arc<dyn ErasedItem<T> + Send + Sync + 'static>;

// ── Public handler traits ─────────────────────────────────────────────────────

/// Implemented for every valid collection handler: any
/// `Fn(Request, Bytes) -> impl Future<Output = impl IntoReply<T>>`.
///
/// Sealed: only the blanket impl below satisfies it.
pub trait CollectionHandler<T>: private::Sealed<(T,)> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_collection(self) -> BoxedCollection<T>;
}

/// Implemented for every valid item handler: any
/// `Fn(Request, String, Bytes) -> impl Future<Output = impl IntoReply<T>>`.
pub trait ItemHandler<T>: private::Sealed<((), T)> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_item(self) -> BoxedItem<T>;
}

mod private {
    pub trait Sealed<M> {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R, T> private::Sealed<(T,)> for F
where
    F: Fn(Request, Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply<T> + Send + 'static,
    T: 'static,
{
}

impl<F, Fut, R, T> CollectionHandler<T> for F
where
    F: Fn(Request, Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply<T> + Send + 'static,
    T: 'static,
{
    fn into_boxed_collection(self) -> BoxedCollection<T> {
        Arc::new(FnCollection(self))
    }
}

impl<F, Fut, R, T> private::Sealed<((), T)> for F
where
    F: Fn(Request, String, Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply<T> + Send + 'static,
    T: 'static,
{
}

impl<F, Fut, R, T> ItemHandler<T> for F
where
    F: Fn(Request, String, Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply<T> + Send + 'static,
    T: 'static,
{
    fn into_boxed_item(self) -> BoxedItem<T> {
        Arc::new(FnItem(self))
    }
}

// ── Concrete wrappers ─────────────────────────────────────────────────────────

struct FnCollection<F>(F);

impl<F, Fut, R, T> ErasedCollection<T> for FnCollection<F>
where
    F: Fn(Request, Bytes) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply<T> + Send + 'static,
{
    fn call(&self, req: Request, body: Bytes) -> BoxFuture<T> {
        let fut = (self.0)(req, body);
        Box::pin(async move { fut.await.into_reply() })
    }
}

struct FnItem<F>(F);

impl<F, Fut, R, T> ErasedItem<T> for FnItem<F>
where
    F: Fn(Request, String, Bytes) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply<T> + Send + 'static,
{
    fn call(&self, req: Request, id: String, body: Bytes) -> BoxFuture<T> {
        let fut = (self.0)(req, id, body);
        Box::pin(async move { fut.await.into_reply() })
    }
}

// ── Stubs ─────────────────────────────────────────────────────────────────────

/// Collection stub every unset slot starts with. Always fails with `NotImplemented`.
pub async fn unimplemented_collection<T>(_req: Request, _body: Bytes) -> Reply<T> {
    Reply::not_implemented()
}

/// Item stub every unset slot starts with. Always fails with `NotImplemented`.
pub async fn unimplemented_item<T>(_req: Request, _id: String, _body: Bytes) -> Reply<T> {
    Reply::not_implemented()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        let (parts, ()) = http::Request::get("/widgets").body(()).unwrap().into_parts();
        Request::from_parts(parts)
    }

    #[test]
    fn result_converts_into_reply() {
        let reply = Ok::<u32, HandlerError>(7).into_reply();
        assert_eq!(reply.value, Some(7));
        assert!(reply.error.is_none());

        let reply = Err::<u32, _>(HandlerError::not_found()).into_reply();
        assert!(reply.value.is_none());
        assert_eq!(reply.error.map(|e| e.kind()), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn stubs_report_not_implemented() {
        let collection = unimplemented_collection::<u32>.into_boxed_collection();
        let reply = collection.call(request(), Bytes::new()).await;
        assert_eq!(reply.error.map(|e| e.kind()), Some(ErrorKind::NotImplemented));

        let item = unimplemented_item::<u32>.into_boxed_item();
        let reply = item.call(request(), "1".to_owned(), Bytes::new()).await;
        assert!(reply.value.is_none());
        assert_eq!(reply.error.map(|e| e.kind()), Some(ErrorKind::NotImplemented));
    }

    #[tokio::test]
    async fn closures_receive_id_and_body() {
        let item = (|_req: Request, id: String, body: Bytes| async move {
            Ok::<_, HandlerError>(format!("{id}:{}", body.len()))
        })
        .into_boxed_item();

        let reply = item.call(request(), "42".to_owned(), Bytes::from_static(b"abc")).await;
        assert_eq!(reply.value.as_deref(), Some("42:3"));
    }
}
