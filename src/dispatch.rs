//! The dispatcher: everything that happens after a route rule matched.
//!
//! ```text
//! select logger → extract id → size check → read body → invoke handler
//!        → serialize value → resolve status → write response
//! ```
//!
//! The size check and the body read are terminal on failure: no handler
//! runs and nothing is serialized. Serialization always runs once a handler
//! has replied, even when it replied with an error, and a serialization
//! failure wins over whatever error the handler reported.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderName, Method, StatusCode};
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;
use hyper::body::Body;

use crate::endpoint::Endpoint;
use crate::handler::Reply;
use crate::logger::Logger;
use crate::request::Request;
use crate::response::{HANDLED_BY, HANDLED_BY_HEADER, Response};
use crate::status::{ErrorKind, HandlerError};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request body as the dispatcher sees it, whatever the transport produced.
pub(crate) type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

pub(crate) fn box_body<B>(body: B) -> RequestBody
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(Into::<BoxError>::into).boxed_unsync()
}

// ── DispatchContext ───────────────────────────────────────────────────────────

/// Per-request state: the endpoint, the logger picked for this request and
/// the item id (empty for collection requests).
pub(crate) struct DispatchContext<'a, T> {
    endpoint: &'a Endpoint<T>,
    logger: Arc<dyn Logger>,
    id: String,
}

impl<'a, T> DispatchContext<'a, T> {
    pub(crate) fn new(endpoint: &'a Endpoint<T>, req: &Request, id: String) -> Self {
        let logger = endpoint.logger.select(req);
        if !id.is_empty() {
            logger.debug(format_args!("id: {id}"));
        }
        Self { endpoint, logger, id }
    }

    /// Runs the handler for `(shape, method)`. Methods with no slot get
    /// `NotImplemented` without any handler being called.
    async fn invoke(&self, req: Request, body: Bytes) -> Reply<T> {
        let e = self.endpoint;
        if self.id.is_empty() {
            match *req.method() {
                Method::GET => e.get_collection.call(req, body).await,
                Method::POST => e.post_collection.call(req, body).await,
                _ => Reply::not_implemented(),
            }
        } else {
            let slot = match *req.method() {
                Method::HEAD => &e.head,
                Method::GET => &e.get,
                Method::POST => &e.post,
                Method::PUT => &e.put,
                Method::DELETE => &e.delete,
                _ => return Reply::not_implemented(),
            };
            slot.call(req, self.id.clone(), body).await
        }
    }

    fn resolve_status(&self, error: Option<&HandlerError>, method: &Method) -> StatusCode {
        let Some(error) = error else {
            return StatusCode::OK;
        };
        if error.kind() == ErrorKind::NotImplemented {
            return StatusCode::NOT_IMPLEMENTED;
        }

        self.logger.error(format_args!(
            "error returned by handler: id {:?}, method {method}, error {error}",
            self.id,
        ));
        self.endpoint
            .status_table
            .get(error.kind())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

// ── dispatch ──────────────────────────────────────────────────────────────────

/// Serves one request that a dispatch rule matched.
///
/// `id` is the captured item identifier, or empty for the collection path.
pub(crate) async fn dispatch<T>(
    endpoint: &Endpoint<T>,
    req: http::Request<RequestBody>,
    id: String,
) -> Response {
    let (parts, body) = req.into_parts();
    let req = Request::from_parts(parts);
    let ctx = DispatchContext::new(endpoint, &req, id);
    let codec = &endpoint.codec;

    // Declared length: the header, or the exact size the body reports.
    let declared = req.content_length().or_else(|| body.size_hint().exact());
    if let Some(len) = declared.filter(|&len| len > codec.max_body_bytes()) {
        ctx.logger.error(format_args!(
            "request body too large: max {} bytes, was {len}",
            codec.max_body_bytes(),
        ));
        return Response::status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let data = match declared {
        Some(len) if len > 0 => match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                ctx.logger.error(format_args!("error reading request body: {e}"));
                return Response::status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        },
        _ => Bytes::new(),
    };

    let method = req.method().clone();
    let reply = ctx.invoke(req, data).await;

    let payload = match codec.serialize(reply.value.as_ref()) {
        Ok(payload) => payload,
        Err(e) => {
            ctx.logger.error(format_args!("error serializing return value: {e}"));
            return Response::status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let status = ctx.resolve_status(reply.error.as_ref(), &method);

    Response::builder()
        .status(status)
        .header(HeaderName::from_static(HANDLED_BY_HEADER), HANDLED_BY)
        .body(codec.accepts(), payload)
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    use http_body_util::{Empty, Full};
    use hyper::body::Frame;
    use tracing::Level;

    use super::*;
    use crate::codec::{Codec, SerializationError};
    use crate::status::Sentinel;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<(Level, String)>>>);

    impl Capture {
        fn lines(&self) -> Vec<(Level, String)> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Logger for Capture {
        fn log(&self, level: Level, args: fmt::Arguments<'_>) {
            self.0.lock().unwrap().push((level, args.to_string()));
        }
    }

    /// A body that fails on first poll.
    struct Broken;

    impl Body for Broken {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "peer went away",
            ))))
        }
    }

    fn request(method: Method, uri: &str, body: Vec<u8>) -> http::Request<RequestBody> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(box_body(Full::new(Bytes::from(body))))
            .unwrap()
    }

    fn counting_post(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn(Request, String, Bytes) -> std::future::Ready<Reply<usize>> + Send + Sync + 'static {
        move |_req: Request, _id: String, body: Bytes| {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Reply::ok(body.len()))
        }
    }

    #[tokio::test]
    async fn defaults_answer_not_implemented() {
        let endpoint = Endpoint::<u32>::builder("yams", Codec::text()).build();

        let res = dispatch(&endpoint, request(Method::GET, "/yams", vec![]), String::new()).await;
        assert_eq!(res.status_code(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(res.header("content-type"), Some("text/plain"));
        assert_eq!(res.header(HANDLED_BY_HEADER), Some(HANDLED_BY));

        for method in [Method::HEAD, Method::GET, Method::POST, Method::PUT, Method::DELETE] {
            let res = dispatch(&endpoint, request(method, "/yams/1", vec![]), "1".to_owned()).await;
            assert_eq!(res.status_code(), StatusCode::NOT_IMPLEMENTED);
        }
    }

    #[tokio::test]
    async fn methods_without_a_slot_skip_handlers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let endpoint = Endpoint::builder("yams", Codec::text())
            .post(counting_post(Arc::clone(&calls)))
            .build();

        let res = dispatch(&endpoint, request(Method::PATCH, "/yams/1", vec![]), "1".to_owned()).await;
        assert_eq!(res.status_code(), StatusCode::NOT_IMPLEMENTED);

        let res = dispatch(&endpoint, request(Method::DELETE, "/yams", vec![]), String::new()).await;
        assert_eq!(res.status_code(), StatusCode::NOT_IMPLEMENTED);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn body_at_limit_is_read() {
        let calls = Arc::new(AtomicUsize::new(0));
        let endpoint = Endpoint::builder("yams", Codec::text())
            .post(counting_post(Arc::clone(&calls)))
            .build();

        let res = dispatch(&endpoint, request(Method::POST, "/yams/1", vec![7; 1024]), "1".to_owned()).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"1024");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn body_over_limit_is_rejected_unread() {
        let calls = Arc::new(AtomicUsize::new(0));
        let capture = Capture::default();
        let endpoint = Endpoint::builder("yams", Codec::text())
            .post(counting_post(Arc::clone(&calls)))
            .logger(capture.clone())
            .build();

        let res = dispatch(&endpoint, request(Method::POST, "/yams/1", vec![7; 1025]), "1".to_owned()).await;
        assert_eq!(res.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(res.body().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(capture.lines().iter().any(|(level, line)| {
            *level == Level::ERROR && line == "request body too large: max 1024 bytes, was 1025"
        }));
    }

    #[tokio::test]
    async fn declared_length_header_is_checked_before_reading() {
        let calls = Arc::new(AtomicUsize::new(0));
        let endpoint = Endpoint::builder("yams", Codec::text())
            .post(counting_post(Arc::clone(&calls)))
            .build();

        // The header lies; the body is never consulted.
        let req = http::Request::post("/yams/1")
            .header("content-length", "4096")
            .body(box_body(Empty::<Bytes>::new()))
            .unwrap();
        let res = dispatch(&endpoint, req, "1".to_owned()).await;
        assert_eq!(res.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn read_failure_is_logged_and_answers_500() {
        let calls = Arc::new(AtomicUsize::new(0));
        let capture = Capture::default();
        let endpoint = Endpoint::builder("yams", Codec::text())
            .post(counting_post(Arc::clone(&calls)))
            .logger(capture.clone())
            .build();

        let req = http::Request::post("/yams/1")
            .header("content-length", "5")
            .body(box_body(Broken))
            .unwrap();
        let res = dispatch(&endpoint, req, "1".to_owned()).await;

        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.body().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(capture.lines().iter().any(|(_, line)| line.starts_with("error reading request body")));
    }

    #[tokio::test]
    async fn success_serializes_value() {
        let endpoint = Endpoint::builder("yams", Codec::text())
            .get_collection(|_req: Request, _body: Bytes| async { Reply::ok(vec![1, 2, 3]) })
            .build();

        let res = dispatch(&endpoint, request(Method::GET, "/yams", vec![]), String::new()).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"[1, 2, 3]");
    }

    #[tokio::test]
    async fn mapped_and_unmapped_errors() {
        let locked = Sentinel::new("locked");
        let unmapped = Sentinel::new("locked");
        let capture = Capture::default();

        let endpoint = Endpoint::<String>::builder("yams", Codec::text())
            .get(move |_req: Request, id: String, _body: Bytes| async move {
                match id.as_str() {
                    "missing" => Reply::err(ErrorKind::NotFound),
                    "locked" => Reply::with_error("partial".to_owned(), locked),
                    _ => Reply::err(unmapped),
                }
            })
            .status(ErrorKind::Custom(locked), StatusCode::LOCKED)
            .logger(capture.clone())
            .build();

        let res = dispatch(&endpoint, request(Method::GET, "/yams/missing", vec![]), "missing".to_owned()).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

        let res = dispatch(&endpoint, request(Method::GET, "/yams/locked", vec![]), "locked".to_owned()).await;
        assert_eq!(res.status_code(), StatusCode::LOCKED);
        assert_eq!(res.body().as_ref(), b"\"partial\"");

        let res = dispatch(&endpoint, request(Method::GET, "/yams/other", vec![]), "other".to_owned()).await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.header(HANDLED_BY_HEADER), Some(HANDLED_BY));

        let errors: Vec<_> = capture
            .lines()
            .into_iter()
            .filter(|(level, _)| *level == Level::ERROR)
            .map(|(_, line)| line)
            .collect();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[2], "error returned by handler: id \"other\", method GET, error locked");
    }

    #[tokio::test]
    async fn serialization_failure_overrides_handler_error() {
        let codec = Codec::new("application/yams", 1 << 10, |_: Option<&u32>| {
            Err(SerializationError::new("cannot encode yams"))
        });
        let capture = Capture::default();
        let endpoint = Endpoint::builder("yams", codec)
            .get(|_req: Request, _id: String, _body: Bytes| async { Reply::err(ErrorKind::NotFound) })
            .logger(capture.clone())
            .build();

        let res = dispatch(&endpoint, request(Method::GET, "/yams/1", vec![]), "1".to_owned()).await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.body().is_empty());
        assert!(capture.lines().iter().any(|(_, line)| line.contains("cannot encode yams")));
    }

    #[tokio::test]
    async fn not_implemented_ignores_the_status_table() {
        let endpoint = Endpoint::<u32>::builder("yams", Codec::text())
            .status(ErrorKind::NotImplemented, StatusCode::IM_A_TEAPOT)
            .build();

        let res = dispatch(&endpoint, request(Method::GET, "/yams/1", vec![]), "1".to_owned()).await;
        assert_eq!(res.status_code(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn request_logger_is_built_per_request() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let capture = Capture::default();
        let sink = capture.clone();

        let endpoint = Endpoint::<u32>::builder("yams", Codec::text())
            .logger(Capture::default())
            .request_logger(move |_req| {
                counter.fetch_add(1, Ordering::SeqCst);
                Arc::new(sink.clone()) as Arc<dyn Logger>
            })
            .build();

        dispatch(&endpoint, request(Method::GET, "/yams/7", vec![]), "7".to_owned()).await;
        dispatch(&endpoint, request(Method::GET, "/yams", vec![]), String::new()).await;

        assert_eq!(built.load(Ordering::SeqCst), 2);
        assert_eq!(capture.lines(), vec![(Level::DEBUG, "id: 7".to_owned())]);
    }
}
