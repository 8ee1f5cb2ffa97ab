//! Incoming HTTP request type.

use http::{HeaderMap, Method, Uri, Version, request::Parts};

/// The head of an incoming request, as handed to handlers and logger factories.
///
/// The body is not part of it: the dispatcher reads it separately, after the
/// size check, and passes the bytes to the handler as their own argument.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
}

impl Request {
    pub(crate) fn from_parts(parts: Parts) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn query(&self) -> Option<&str> { self.uri.query() }
    pub fn version(&self) -> Version { self.version }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Case-insensitive header lookup. Values that are not visible ASCII are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The length the client declared for the body, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.headers.get(http::header::CONTENT_LENGTH)?.to_str().ok()?.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(builder: http::request::Builder) -> Request {
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        Request::from_parts(parts)
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = request(http::Request::get("/widgets").header("Accept", "application/json"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("ACCEPT"), Some("application/json"));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn content_length_is_parsed_from_header() {
        let req = request(http::Request::post("/widgets").header("content-length", "17"));
        assert_eq!(req.content_length(), Some(17));

        let req = request(http::Request::post("/widgets").header("content-length", "lots"));
        assert_eq!(req.content_length(), None);

        let req = request(http::Request::post("/widgets"));
        assert_eq!(req.content_length(), None);
    }

    #[test]
    fn exposes_path_and_query() {
        let req = request(http::Request::get("http://example.com/widgets/42?full=1"));
        assert_eq!(req.path(), "/widgets/42");
        assert_eq!(req.query(), Some("full=1"));
        assert_eq!(req.method(), Method::GET);
    }
}
