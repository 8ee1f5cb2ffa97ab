//! Routing table built from endpoints.
//!
//! Each endpoint registers two path shapes in a `matchit` radix tree:
//! `/{name}` for the collection and `/{name}/{id}` for single items. Behind
//! each shape sits a short, ordered list of rules:
//!
//! | shape      | methods                          | Accept     | outcome  |
//! |------------|----------------------------------|------------|----------|
//! | collection | GET POST                         | matches    | dispatch |
//! | collection | GET POST                         | mismatches | 406      |
//! | collection | anything else                    | any        | 405      |
//! | item       | HEAD GET POST PUT DELETE         | matches    | dispatch |
//! | item       | HEAD GET POST PUT DELETE         | mismatches | 406      |
//! | item       | anything else                    | any        | 405      |
//!
//! The last rule of each shape makes the list exhaustive, extension methods
//! included. Paths the tree does not know and ids outside `[A-Za-z0-9-]+` are
//! answered with an empty 404.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, header};
use hyper::body::Body;
use matchit::Router as MatchitRouter;

use crate::dispatch::{BoxError, RequestBody, box_body, dispatch};
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::response::Response;

// ── Rules ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Shape {
    Collection,
    Item,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum AcceptPredicate {
    Matches,
    Mismatches,
    Any,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Target {
    Dispatch,
    NotAcceptable,
    NotAllowed,
}

/// The methods a rule applies to.
#[derive(Clone, Debug)]
pub(crate) enum Methods {
    OneOf(Vec<Method>),
    NoneOf(Vec<Method>),
}

impl Methods {
    fn contains(&self, method: &Method) -> bool {
        match self {
            Self::OneOf(set) => set.contains(method),
            Self::NoneOf(set) => !set.contains(method),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Rule {
    methods: Methods,
    accept: AcceptPredicate,
    target: Target,
}

impl Rule {
    fn admits(&self, method: &Method, accepted: bool) -> bool {
        self.methods.contains(method)
            && match self.accept {
                AcceptPredicate::Matches => accepted,
                AcceptPredicate::Mismatches => !accepted,
                AcceptPredicate::Any => true,
            }
    }
}

/// The ordered rule list for one path shape.
pub(crate) fn rules(shape: Shape) -> Vec<Rule> {
    let served = match shape {
        Shape::Collection => vec![Method::GET, Method::POST],
        Shape::Item => vec![Method::HEAD, Method::GET, Method::POST, Method::PUT, Method::DELETE],
    };

    vec![
        Rule {
            methods: Methods::OneOf(served.clone()),
            accept: AcceptPredicate::Matches,
            target: Target::Dispatch,
        },
        Rule {
            methods: Methods::OneOf(served.clone()),
            accept: AcceptPredicate::Mismatches,
            target: Target::NotAcceptable,
        },
        Rule { methods: Methods::NoneOf(served), accept: AcceptPredicate::Any, target: Target::NotAllowed },
    ]
}

fn valid_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

// ── Route ─────────────────────────────────────────────────────────────────────

type BoxFuture<'a> = Pin<Box<dyn Future<Output = Response> + Send + 'a>>;

/// An endpoint with its value type erased, so endpoints of different types
/// share one tree.
trait Service: Send + Sync {
    fn accepts(&self) -> &str;
    fn serve(&self, req: http::Request<RequestBody>, id: String) -> BoxFuture<'_>;
}

impl<T: Send + 'static> Service for Endpoint<T> {
    fn accepts(&self) -> &str {
        self.codec.accepts()
    }

    fn serve(&self, req: http::Request<RequestBody>, id: String) -> BoxFuture<'_> {
        Box::pin(dispatch(self, req, id))
    }
}

struct Route {
    shape: Shape,
    rules: Vec<Rule>,
    endpoint: Arc<dyn Service>,
}

impl Route {
    /// First rule admitting the request wins. The rule list is exhaustive, so
    /// the trailing fallback is never reached.
    fn select(&self, method: &Method, headers: &HeaderMap) -> Target {
        let accepts = self.endpoint.accepts();
        let accepted = headers
            .get_all(header::ACCEPT)
            .iter()
            .any(|value| value.as_bytes() == accepts.as_bytes());

        self.rules
            .iter()
            .find(|rule| rule.admits(method, accepted))
            .map_or(Target::NotAllowed, |rule| rule.target)
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The application router.
///
/// Build it once at startup, register every endpoint, then hand it to
/// [`Server::serve`](crate::Server::serve) or drive it directly with
/// [`Router::handle`].
///
/// ```rust
/// use restpoint::{Codec, Endpoint, Router};
///
/// # fn main() -> Result<(), restpoint::Error> {
/// let router = Router::new()
///     .endpoint(Endpoint::<String>::builder("widgets", Codec::json()).build())?
///     .endpoint(Endpoint::<String>::builder("gadgets", Codec::text()).build())?;
/// # Ok(())
/// # }
/// ```
pub struct Router {
    tree: MatchitRouter<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { tree: MatchitRouter::new() }
    }

    /// Registers `/{name}` and `/{name}/{id}` for `endpoint`.
    ///
    /// Fails if the name clashes with an endpoint already registered or
    /// contains route syntax.
    pub fn endpoint<T: Send + 'static>(mut self, endpoint: Endpoint<T>) -> Result<Self, Error> {
        let collection = format!("/{}", endpoint.name());
        let item = format!("{collection}/{{id}}");
        let endpoint: Arc<dyn Service> = Arc::new(endpoint);

        for (path, shape) in [(collection, Shape::Collection), (item, Shape::Item)] {
            let route = Route { shape, rules: rules(shape), endpoint: Arc::clone(&endpoint) };
            self.tree
                .insert(path.as_str(), route)
                .map_err(|source| Error::InvalidRoute { path, source })?;
        }
        Ok(self)
    }

    /// Routes one request and produces one response.
    pub async fn handle<B>(&self, req: http::Request<B>) -> Response
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let Some((route, id)) = self.lookup(req.uri().path()) else {
            return Response::status(StatusCode::NOT_FOUND);
        };

        match route.select(req.method(), req.headers()) {
            Target::Dispatch => route.endpoint.serve(req.map(box_body), id).await,
            Target::NotAcceptable => Response::status(StatusCode::NOT_ACCEPTABLE),
            Target::NotAllowed => Response::status(StatusCode::METHOD_NOT_ALLOWED),
        }
    }

    fn lookup(&self, path: &str) -> Option<(&Route, String)> {
        let matched = self.tree.at(path).ok()?;
        let route = matched.value;
        match route.shape {
            Shape::Collection => Some((route, String::new())),
            Shape::Item => {
                let id = matched.params.get("id")?;
                valid_id(id).then(|| (route, id.to_owned()))
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
