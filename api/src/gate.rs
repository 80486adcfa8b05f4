//! The decision gate in front of every protected route.
//!
//! A route declares *what* must be authorized by implementing
//! [`AuthorizedHandler`]; [`guarded`] wraps it into an axum handler that runs
//! the authorization cycle before the protected logic. Routes are only ever
//! registered through [`guarded`], so no handler can skip the gate.
//!
//! # Authorization Flow
//!
//! START → ACTION_RESOLVED → RESOURCE_RESOLVED → ENTITIES_BUILT →
//! QUERY_ASSEMBLED → DECISION_RECEIVED → ALLOWED | DENIED | ERRORED
//!
//! - ALLOWED: verdict is exactly ALLOW; the handler runs once and its
//!   response is passed through
//! - DENIED: any other verdict, including none; 403, handler never runs
//! - ERRORED: the decision client failed; 400, handler never runs
//!
//! # Security Notes
//!
//! - The principal comes from the upstream identity extension only
//! - Every ambiguity fails closed: no identity (401), an undecodable path
//!   (400), a broken descriptor (500), an engine failure (400) and a
//!   non-ALLOW verdict (403) all skip the handler
//! - Diagnostics are logged, never returned to the client

use async_trait::async_trait;
use authz::{Action, AuthorizationQuery, EntityGraph, Principal, Resource};
use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    response::{IntoResponse, Response},
    Extension,
};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{error::ApiError, middleware_hooks::Identity, schema, AppState};

/// The request data visible to action descriptors and protected handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: Identity,
    pub params: HashMap<String, String>,
    pub body: Bytes,
}

impl RequestContext {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            params: HashMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Contract implemented once per protected route.
///
/// The descriptor methods say what is being authorized; [`handle`] is the
/// protected logic and is called only after an ALLOW verdict for exactly the
/// action and resource the descriptor reported.
///
/// [`handle`]: AuthorizedHandler::handle
#[async_trait]
pub trait AuthorizedHandler: Send + Sync + 'static {
    /// The action id, e.g. `"ViewPhoto"`.
    fn action(&self, ctx: &RequestContext) -> String;

    /// The action type tag. Constant per deployment.
    fn action_type(&self) -> &str {
        schema::ACTION_TYPE
    }

    /// The resource as `(type, id)`.
    fn resource(&self, ctx: &RequestContext) -> (String, String);

    /// The entities the engine needs for this decision. Returns an empty
    /// graph rather than an error when the resource cannot be resolved.
    async fn entities(&self, ctx: &RequestContext) -> EntityGraph;

    async fn handle(&self, ctx: RequestContext) -> Response;
}

/// Stages of one authorization cycle, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    ActionResolved,
    ResourceResolved,
    EntitiesBuilt,
    QueryAssembled,
    DecisionReceived,
    Allowed,
    Denied,
    Errored,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "START",
            Stage::ActionResolved => "ACTION_RESOLVED",
            Stage::ResourceResolved => "RESOURCE_RESOLVED",
            Stage::EntitiesBuilt => "ENTITIES_BUILT",
            Stage::QueryAssembled => "QUERY_ASSEMBLED",
            Stage::DecisionReceived => "DECISION_RECEIVED",
            Stage::Allowed => "ALLOWED",
            Stage::Denied => "DENIED",
            Stage::Errored => "ERRORED",
        };
        f.write_str(name)
    }
}

pub type GuardedFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Wraps a descriptor into an axum handler that enforces authorization.
///
/// Path parameters that cannot be decoded are rejected with 400 before any
/// descriptor runs, so client input never reaches the query assembler as an
/// empty resource id.
pub fn guarded<H>(
    handler: H,
) -> impl Fn(
    State<AppState>,
    Option<Extension<Identity>>,
    Result<Path<HashMap<String, String>>, PathRejection>,
    Bytes,
) -> GuardedFuture
       + Clone
       + Send
       + Sync
       + 'static
where
    H: AuthorizedHandler,
{
    let handler = Arc::new(handler);
    move |State(state): State<AppState>,
          identity: Option<Extension<Identity>>,
          params: Result<Path<HashMap<String, String>>, PathRejection>,
          body: Bytes| {
        let handler = Arc::clone(&handler);
        Box::pin(async move {
            let Some(Extension(identity)) = identity else {
                warn!("AUTHZ GATE: request without an upstream identity, rejecting");
                return ApiError::Unauthorized.into_response();
            };
            let params = match params {
                Ok(Path(params)) => params,
                // Routes without parameters, e.g. /photo/upload
                Err(PathRejection::MissingPathParams(_)) => HashMap::new(),
                Err(rejection) => {
                    warn!("AUTHZ GATE: rejecting undecodable path: {}", rejection.body_text());
                    return ApiError::BadRequest(rejection.body_text()).into_response();
                }
            };
            let ctx = RequestContext {
                identity,
                params,
                body,
            };
            enforce(&state, handler.as_ref(), ctx).await
        }) as GuardedFuture
    }
}

/// Runs one authorization cycle and, on ALLOW, the protected handler.
pub async fn enforce(
    state: &AppState,
    handler: &dyn AuthorizedHandler,
    ctx: RequestContext,
) -> Response {
    match authorize(state, handler, &ctx).await {
        Ok(()) => handler.handle(ctx).await,
        Err(e) => e.into_response(),
    }
}

async fn authorize(
    state: &AppState,
    handler: &dyn AuthorizedHandler,
    ctx: &RequestContext,
) -> Result<(), ApiError> {
    debug!("AUTHZ GATE: {}", Stage::Start);

    let action = Action::new(handler.action(ctx), handler.action_type());
    debug!("AUTHZ GATE: {} action={}", Stage::ActionResolved, action.id);

    let (resource_type, resource_id) = handler.resource(ctx);
    let resource = Resource::new(resource_id, resource_type);
    debug!("AUTHZ GATE: {} resource={}", Stage::ResourceResolved, resource.uid());

    let entities = handler.entities(ctx).await;
    debug!("AUTHZ GATE: {} entities={}", Stage::EntitiesBuilt, entities.len());

    let principal = Principal::new(&ctx.identity.user_id, schema::USER_TYPE);
    let query = AuthorizationQuery::assemble(
        principal,
        action,
        resource,
        entities,
        &state.settings.policy_store_id,
    )
    .map_err(|e| {
        error!("AUTHZ GATE: {}: {}", Stage::Errored, e);
        ApiError::InternalError("authorization query could not be built".to_string())
    })?;
    debug!("AUTHZ GATE: {}", Stage::QueryAssembled);

    let decision = state.decision.decide(&query).await.map_err(|e| {
        error!(
            "AUTHZ GATE: {} engine={} action={} resource={} principal={}: {}",
            Stage::Errored,
            state.decision.name(),
            query.action().id,
            query.resource().uid(),
            query.principal().uid(),
            e
        );
        ApiError::DecisionEngine
    })?;
    debug!("AUTHZ GATE: {} verdict={:?}", Stage::DecisionReceived, decision.verdict);

    if decision.is_allow() {
        info!(
            "AUTHZ GATE: {} {} {} {}",
            Stage::Allowed,
            query.principal().id,
            query.action().id,
            query.resource().uid()
        );
        Ok(())
    } else {
        warn!(
            "AUTHZ GATE: {} {} {} {} verdict={:?} diagnostics={:?}",
            Stage::Denied,
            query.principal().id,
            query.action().id,
            query.resource().uid(),
            decision.verdict,
            decision.diagnostics
        );
        Err(ApiError::Forbidden)
    }
}
