//! Logging capability used by the dispatcher.
//!
//! The dispatcher never calls `tracing` directly: it logs through a
//! [`Logger`], picked once per request from the endpoint's [`LoggerSource`].
//! The default, [`TracingLogger`], forwards everything to `tracing`.
//!
//! Swap in your own implementation to route an endpoint's events elsewhere,
//! or install a per-request factory to tag every line with request data:
//!
//! ```rust
//! use std::sync::Arc;
//! use restpoint::{Codec, Endpoint, Logger, TracingLogger};
//!
//! let endpoint = Endpoint::<String>::builder("widgets", Codec::text())
//!     .request_logger(|req| Arc::new(TracingLogger::for_request("widgets", req)) as Arc<dyn Logger>)
//!     .build();
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::Level;

use crate::request::Request;

/// A sink for the dispatcher's lifecycle events.
///
/// Must be safe to share between concurrent requests.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, args: fmt::Arguments<'_>);

    fn debug(&self, args: fmt::Arguments<'_>) { self.log(Level::DEBUG, args) }
    fn info(&self, args: fmt::Arguments<'_>) { self.log(Level::INFO, args) }
    fn warn(&self, args: fmt::Arguments<'_>) { self.log(Level::WARN, args) }
    fn error(&self, args: fmt::Arguments<'_>) { self.log(Level::ERROR, args) }
}

// ── TracingLogger ─────────────────────────────────────────────────────────────

/// Forwards to `tracing` events, tagged with the endpoint name.
#[derive(Clone, Debug)]
pub struct TracingLogger {
    endpoint: String,
    request: Option<(String, String)>,
}

impl TracingLogger {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), request: None }
    }

    /// A logger whose events also carry the request's method and path.
    pub fn for_request(endpoint: impl Into<String>, req: &Request) -> Self {
        Self {
            endpoint: endpoint.into(),
            request: Some((req.method().to_string(), req.path().to_owned())),
        }
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let endpoint = &self.endpoint;
        let request = &self.request;

        // `tracing` needs the level at compile time.
        macro_rules! emit {
            ($lvl:expr) => {
                match request {
                    Some((method, path)) => tracing::event!(
                        $lvl,
                        endpoint = %endpoint,
                        method = %method,
                        path = %path,
                        "{}",
                        args
                    ),
                    None => tracing::event!($lvl, endpoint = %endpoint, "{}", args),
                }
            };
        }

        if level == Level::TRACE {
            emit!(Level::TRACE)
        } else if level == Level::DEBUG {
            emit!(Level::DEBUG)
        } else if level == Level::INFO {
            emit!(Level::INFO)
        } else if level == Level::WARN {
            emit!(Level::WARN)
        } else {
            emit!(Level::ERROR)
        }
    }
}

// ── LoggerSource ──────────────────────────────────────────────────────────────

type LoggerFactory = dyn Fn(&Request) -> Arc<dyn Logger> + Send + Sync;

/// Where a request gets its logger from.
#[derive(Clone)]
pub enum LoggerSource {
    /// One logger shared by every request.
    Fixed(Arc<dyn Logger>),
    /// A factory called once per request; its logger lives as long as the request.
    PerRequest(Arc<LoggerFactory>),
}

impl LoggerSource {
    pub(crate) fn select(&self, req: &Request) -> Arc<dyn Logger> {
        match self {
            Self::Fixed(logger) => Arc::clone(logger),
            Self::PerRequest(factory) => factory(req),
        }
    }
}

impl fmt::Debug for LoggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(_) => f.write_str("LoggerSource::Fixed"),
            Self::PerRequest(_) => f.write_str("LoggerSource::PerRequest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Capture(Mutex<Vec<(Level, String)>>);

    impl Logger for Capture {
        fn log(&self, level: Level, args: fmt::Arguments<'_>) {
            self.0.lock().unwrap().push((level, args.to_string()));
        }
    }

    fn request() -> Request {
        let (parts, ()) = http::Request::delete("/widgets/9").body(()).unwrap().into_parts();
        Request::from_parts(parts)
    }

    #[test]
    fn level_helpers_route_through_log() {
        let capture = Capture::default();
        capture.debug(format_args!("id: {}", 9));
        capture.error(format_args!("boom"));

        let lines = capture.0.lock().unwrap();
        assert_eq!(*lines, vec![(Level::DEBUG, "id: 9".to_owned()), (Level::ERROR, "boom".to_owned())]);
    }

    #[test]
    fn per_request_factory_runs_once_per_select() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = LoggerSource::PerRequest(Arc::new(move |req: &Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(TracingLogger::for_request("widgets", req)) as Arc<dyn Logger>
        }));

        source.select(&request());
        source.select(&request());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fixed_source_shares_one_logger() {
        let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new("widgets"));
        let source = LoggerSource::Fixed(Arc::clone(&logger));
        assert!(Arc::ptr_eq(&source.select(&request()), &logger));
    }

    #[test]
    fn tracing_logger_records_request_fields() {
        let logger = TracingLogger::for_request("widgets", &request());
        assert_eq!(logger.request, Some(("DELETE".to_owned(), "/widgets/9".to_owned())));
        logger.warn(format_args!("no subscriber installed, event is dropped"));
    }
}
