//! Outgoing HTTP response type.
//!
//! Handlers never build one of these: they return a [`Reply`](crate::Reply)
//! and the dispatcher decides status, headers and body.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use http_body_util::Full;

/// Value of the diagnostic `x-handled-by` header set on dispatched responses.
pub const HANDLED_BY: &str = concat!("restpoint/", env!("CARGO_PKG_VERSION"));

/// Name of the diagnostic header.
pub const HANDLED_BY_HEADER: &str = "x-handled-by";

/// An outgoing HTTP response.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub(crate) fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Converts into the `http` type hyper writes to the wire.
    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`]. Defaults to `200 OK`.
pub(crate) struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub(crate) fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Sets a header. Values that are not valid header text are dropped.
    pub(crate) fn header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Terminate with a body of the given media type.
    pub(crate) fn body(self, content_type: &str, body: impl Into<Bytes>) -> Response {
        self.header(header::CONTENT_TYPE, content_type).finish(body.into())
    }

    fn finish(self, body: Bytes) -> Response {
        Response { body, headers: self.headers, status: self.status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_has_empty_body() {
        let res = Response::status(StatusCode::NOT_ACCEPTABLE);
        assert_eq!(res.status_code(), StatusCode::NOT_ACCEPTABLE);
        assert!(res.body().is_empty());
        assert!(res.headers().is_empty());
    }

    #[test]
    fn builder_sets_content_type_and_headers() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header(HeaderName::from_static(HANDLED_BY_HEADER), HANDLED_BY)
            .body("application/json", b"{}".to_vec());

        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.header("X-Handled-By"), Some(HANDLED_BY));
        assert_eq!(res.body().as_ref(), b"{}");

        let inner = res.into_inner();
        assert_eq!(inner.status(), StatusCode::CREATED);
        assert_eq!(inner.headers()["content-type"], "application/json");
    }
}
