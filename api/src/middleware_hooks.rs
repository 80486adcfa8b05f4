use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Instant;
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::{debug, info, Span};

use crate::AppState;

/// The authenticated caller, established upstream of the gate.
///
/// The gate reads this from the request extensions and never derives it from
/// the request path or body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    /// The account the user belongs to
    pub account_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            account_id: account_id.into(),
        }
    }
}

/// Header carrying the request id, generated when the client sends none
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(REQUEST_ID_HEADER)
}

/// Hands out process-unique, increasing request ids
#[derive(Debug, Clone, Default)]
pub struct SequentialRequestId {
    next: Arc<AtomicU64>,
}

impl MakeRequestId for SequentialRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        Some(RequestId::new(HeaderValue::from(id)))
    }
}

/// Root span for one request. Every gate stage logged while serving the
/// request carries its `request_id`.
pub fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a");

    tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri().path(),
    )
}

/// Identity middleware
///
/// Attaches the configured identity to every request. This stands in for an
/// upstream authenticator: it performs no authentication of its own, and a
/// deployment with real authentication replaces this layer with one that
/// inserts the verified [`Identity`].
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let identity = state.settings.identity.clone();
    debug!(
        "IDENTITY MIDDLEWARE: user={} account={}",
        identity.user_id, identity.account_id
    );
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Request processing middleware hook
/// Logs every request with its final status and duration
pub async fn request_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    info!("REQUEST MIDDLEWARE: {} {}", method, uri);

    let response = next.run(request).await;

    debug!(
        "REQUEST MIDDLEWARE: {} {} -> {} in {:?}",
        method,
        uri,
        response.status(),
        start.elapsed()
    );

    Ok(response)
}
