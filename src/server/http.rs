//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Args;
use crate::routes;
use crate::search::TerritoryAggregator;
use crate::types::AidesError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub aggregator: TerritoryAggregator,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, aggregator: TerritoryAggregator) -> Self {
        Self {
            args,
            aggregator,
            started_at: Instant::now(),
        }
    }
}

/// Accept connections until the process stops
pub async fn run(state: Arc<AppState>) -> Result<(), AidesError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "aides-territoires listening on {} (store: {})",
        state.args.listen,
        state.aggregator.store().kind()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Read the body, then dispatch
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        path = %path,
    );

    async move {
        let started = Instant::now();
        info!("[{}] {} {}", addr, method, path);

        let body = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!("Rejecting request body: {}", e);
                let response = bad_request_response("Request body too large or unreadable");
                return Ok::<_, hyper::Error>(to_boxed(response));
            }
        };

        let response = route(&state, &method, &path, body).await;
        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        Ok(to_boxed(response))
    }
    .instrument(span)
    .await
}

/// Route a request with its collected body
pub async fn route(
    state: &AppState,
    method: &Method,
    path: &str,
    body: Bytes,
) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => routes::health_check(state),

        (&Method::GET, "/version") => routes::version_info(),

        (&Method::GET, "/aides") => routes::list_aides(state).await,

        (&Method::POST, "/aides/search") => routes::search_aides(state, &body).await,

        (&Method::GET, p) => match aide_id(p) {
            Some(id) => routes::get_aide(state, id).await,
            None => not_found_response(p),
        },

        // CORS preflight
        (&Method::OPTIONS, _) => preflight_response(),

        (_, p) => not_found_response(p),
    }
}

/// `/aides/{id}` → `id`
fn aide_id(path: &str) -> Option<&str> {
    path.strip_prefix("/aides/")
        .filter(|id| !id.is_empty() && !id.contains('/'))
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
        "hint": "Try GET /aides or POST /aides/search"
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

/// Bad request response
fn bad_request_response(message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Bad Request",
        "message": message
    });

    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
