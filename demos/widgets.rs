//! A JSON widgets endpoint backed by an in-memory map.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example widgets
//!
//! Try:
//!   curl -H 'accept: application/json' http://localhost:3000/widgets
//!   curl -X PUT -H 'accept: application/json' -d '{"name":"sprocket"}' \
//!        http://localhost:3000/widgets/42
//!   curl -H 'accept: application/json' http://localhost:3000/widgets/42
//!   curl -X DELETE -H 'accept: application/json' http://localhost:3000/widgets/42
//!   curl -i http://localhost:3000/widgets            # 406, no accept header
//!   curl -i -X PATCH http://localhost:3000/widgets/42 # 405, PATCH is not an item verb

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, Mutex};

use bytes::Bytes;
use http::StatusCode;
use restpoint::{ErrorKind, HandlerError, Logger, Request, Router, Sentinel, Server, TracingLogger, json};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

static MALFORMED: LazyLock<Sentinel> = LazyLock::new(|| Sentinel::new("malformed widget"));
static POISONED: LazyLock<Sentinel> = LazyLock::new(|| Sentinel::new("store unavailable"));

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum Body {
    One(Widget),
    Many(Vec<Widget>),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
struct Widget {
    #[serde(default)]
    id: String,
    name: String,
}

type Store = Arc<Mutex<BTreeMap<String, Widget>>>;

#[tokio::main]
async fn main() -> Result<(), restpoint::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = Store::default();

    let list = {
        let store = Arc::clone(&store);
        move |_req: Request, _body: Bytes| {
            let store = Arc::clone(&store);
            async move {
                let widgets = store.lock().map_err(|_| HandlerError::from(*POISONED))?;
                Ok::<_, HandlerError>(Body::Many(widgets.values().cloned().collect()))
            }
        }
    };

    let get = {
        let store = Arc::clone(&store);
        move |_req: Request, id: String, _body: Bytes| {
            let store = Arc::clone(&store);
            async move {
                let widgets = store.lock().map_err(|_| HandlerError::from(*POISONED))?;
                let widget = widgets.get(&id).cloned().ok_or_else(HandlerError::not_found)?;
                Ok::<_, HandlerError>(Body::One(widget))
            }
        }
    };

    let put = {
        let store = Arc::clone(&store);
        move |_req: Request, id: String, body: Bytes| {
            let store = Arc::clone(&store);
            async move {
                let mut widget: Widget = json::decode(&body, ErrorKind::Custom(*MALFORMED))?;
                widget.id = id.clone();
                let mut widgets = store.lock().map_err(|_| HandlerError::from(*POISONED))?;
                widgets.insert(id, widget.clone());
                Ok::<_, HandlerError>(Body::One(widget))
            }
        }
    };

    let delete = {
        let store = Arc::clone(&store);
        move |_req: Request, id: String, _body: Bytes| {
            let store = Arc::clone(&store);
            async move {
                let mut widgets = store.lock().map_err(|_| HandlerError::from(*POISONED))?;
                let widget = widgets.remove(&id).ok_or_else(HandlerError::not_found)?;
                Ok::<_, HandlerError>(Body::One(widget))
            }
        }
    };

    let widgets = json::endpoint("widgets")
        .get_collection(list)
        .get(get)
        .put(put)
        .delete(delete)
        .status(ErrorKind::Custom(*MALFORMED), StatusCode::BAD_REQUEST)
        .status(ErrorKind::Custom(*POISONED), StatusCode::SERVICE_UNAVAILABLE)
        .request_logger(|req| Arc::new(TracingLogger::for_request("widgets", req)) as Arc<dyn Logger>)
        .build();

    let router = Router::new().endpoint(widgets)?;
    Server::bind("0.0.0.0:3000")?.serve(router).await
}
