//! Integration tests for the authorization gate
//!
//! These tests drive real routers with a scripted decision client and a
//! handler that counts its invocations, then check that the handler runs if
//! and only if the verdict is exactly ALLOW.

#[cfg(test)]
mod tests {
    use crate::{
        create_router,
        gate::{guarded, AuthorizedHandler, RequestContext},
        middleware_hooks::{identity_middleware, Identity, REQUEST_ID_HEADER},
        schema,
        store::{InMemoryPhotoStore, PhotoStore},
        AppState, GatewaySettings,
    };
    use async_trait::async_trait;
    use authz::{
        cedar::CedarDecisionClient, AuthorizationQuery, AuthzError, Decision, DecisionClient,
        Diagnostics, Entity, EntityGraph,
    };
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        middleware,
        response::{IntoResponse, Response},
        routing::get,
        Router,
    };
    use serde_json::Value;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };
    use tower::ServiceExt;

    const POLICIES: &str = r#"
        permit (
            principal,
            action in [PhotoFlash::Action::"ViewPhoto", PhotoFlash::Action::"UploadPhoto"],
            resource
        )
        when { principal has Account && resource in principal.Account };
    "#;

    enum Script {
        Verdict(Option<&'static str>),
        Fail,
    }

    /// Decision client that answers from a script and records every query
    struct ScriptedClient {
        script: Script,
        queries: Mutex<Vec<AuthorizationQuery>>,
    }

    impl ScriptedClient {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                queries: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.queries.lock().unwrap().len()
        }

        fn last_query(&self) -> AuthorizationQuery {
            self.queries.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl DecisionClient for ScriptedClient {
        async fn decide(&self, query: &AuthorizationQuery) -> authz::Result<Decision> {
            self.queries.lock().unwrap().push(query.clone());
            match self.script {
                Script::Verdict(v) => Ok(Decision::new(
                    v.map(str::to_string),
                    Diagnostics::default(),
                )),
                Script::Fail => Err(AuthzError::Transport("connection refused".into())),
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    /// Protected handler that only counts how often it runs
    struct CountingHandler {
        calls: Arc<AtomicUsize>,
        action: &'static str,
    }

    #[async_trait]
    impl AuthorizedHandler for CountingHandler {
        fn action(&self, _ctx: &RequestContext) -> String {
            self.action.to_string()
        }

        fn resource(&self, ctx: &RequestContext) -> (String, String) {
            (
                schema::PHOTO_TYPE.to_string(),
                ctx.param("id").unwrap_or_default().to_string(),
            )
        }

        async fn entities(&self, ctx: &RequestContext) -> EntityGraph {
            EntityGraph::new().with(Entity::new(schema::user_uid(&ctx.identity.user_id)))
        }

        async fn handle(&self, _ctx: RequestContext) -> Response {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (StatusCode::OK, "protected").into_response()
        }
    }

    fn state(decision: Arc<dyn DecisionClient>) -> AppState {
        AppState {
            decision,
            photos: Arc::new(InMemoryPhotoStore::seeded()) as Arc<dyn PhotoStore>,
            settings: Arc::new(GatewaySettings {
                policy_store_id: "ps-test".to_string(),
                identity: Identity::new("test", "test"),
                photo_base_url: "https://dummy.com".to_string(),
            }),
        }
    }

    fn counting_router(state: AppState, calls: Arc<AtomicUsize>, action: &'static str) -> Router {
        Router::new()
            .route("/items/:id", get(guarded(CountingHandler { calls, action })))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                identity_middleware,
            ))
            .with_state(state)
    }

    async fn send(router: Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_allow_runs_handler_once() {
        let client = ScriptedClient::new(Script::Verdict(Some("ALLOW")));
        let calls = Arc::new(AtomicUsize::new(0));
        let router = counting_router(state(client.clone()), calls.clone(), "ViewPhoto");

        let (status, body) = send(router, Method::GET, "/items/1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"protected");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_allow_verdicts_are_forbidden() {
        for verdict in [None, Some(""), Some("DENY"), Some("allow"), Some("MAYBE")] {
            let client = ScriptedClient::new(Script::Verdict(verdict));
            let calls = Arc::new(AtomicUsize::new(0));
            let router = counting_router(state(client.clone()), calls.clone(), "ViewPhoto");

            let (status, _) = send(router, Method::GET, "/items/1").await;

            assert_eq!(status, StatusCode::FORBIDDEN, "verdict {:?}", verdict);
            assert_eq!(calls.load(Ordering::SeqCst), 0, "verdict {:?}", verdict);
        }
    }

    #[tokio::test]
    async fn test_engine_error_is_bad_request() {
        let client = ScriptedClient::new(Script::Fail);
        let calls = Arc::new(AtomicUsize::new(0));
        let router = counting_router(state(client.clone()), calls.clone(), "ViewPhoto");

        let (status, body) = send(router, Method::GET, "/items/1").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "DECISION_ENGINE_ERROR");
    }

    #[tokio::test]
    async fn test_denial_body_leaks_no_diagnostics() {
        let client = ScriptedClient::new(Script::Verdict(Some("DENY")));
        let router = counting_router(state(client), Arc::new(AtomicUsize::new(0)), "ViewPhoto");

        let (_, body) = send(router, Method::GET, "/items/1").await;
        let body: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(body["error"]["code"], "FORBIDDEN");
        assert_eq!(body["error"]["message"], "Forbidden");
    }

    #[tokio::test]
    async fn test_contract_violation_never_reaches_engine() {
        let client = ScriptedClient::new(Script::Verdict(Some("ALLOW")));
        let calls = Arc::new(AtomicUsize::new(0));
        let router = counting_router(state(client.clone()), calls.clone(), "");

        let (status, _) = send(router, Method::GET, "/items/1").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(client.calls(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let client = ScriptedClient::new(Script::Verdict(Some("ALLOW")));
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/items/:id",
                get(guarded(CountingHandler {
                    calls: calls.clone(),
                    action: "ViewPhoto",
                })),
            )
            .with_state(state(client.clone()));

        let (status, _) = send(router, Method::GET, "/items/1").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(client.calls(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_carries_descriptor_and_settings() {
        let client = ScriptedClient::new(Script::Verdict(Some("ALLOW")));
        let router = counting_router(state(client.clone()), Arc::new(AtomicUsize::new(0)), "ViewPhoto");

        send(router, Method::GET, "/items/42").await;
        let query = client.last_query();

        assert_eq!(query.action().id, "ViewPhoto");
        assert_eq!(query.action().action_type, schema::ACTION_TYPE);
        assert_eq!(query.resource().uid(), schema::photo_uid("42"));
        assert_eq!(query.principal().uid(), schema::user_uid("test"));
        assert_eq!(query.policy_store_id(), "ps-test");
    }

    #[tokio::test]
    async fn test_cross_account_query_through_router() {
        let client = ScriptedClient::new(Script::Verdict(Some("DENY")));
        let router = create_router(state(client.clone()));

        let (status, _) = send(router, Method::GET, "/api/v1/photo/3").await;
        let query = client.last_query();

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            query.entities().parents_of(&schema::photo_uid("3")),
            &[schema::account_uid("other")]
        );
    }

    #[tokio::test]
    async fn test_missing_photo_query_has_no_resource_entity() {
        let client = ScriptedClient::new(Script::Verdict(Some("DENY")));
        let router = create_router(state(client.clone()));

        send(router, Method::GET, "/api/v1/photo/99").await;
        let query = client.last_query();

        assert!(query.entities().is_empty());
        assert_eq!(query.resource().id, "99");
    }

    #[tokio::test]
    async fn test_undecodable_path_is_bad_request() {
        let client = ScriptedClient::new(Script::Verdict(Some("ALLOW")));

        let (status, body) = send(create_router(state(client.clone())), Method::GET, "/api/v1/photo/%FF").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(client.calls(), 0, "engine must not see an undecodable id");
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_undecodable_path_never_runs_handler() {
        let client = ScriptedClient::new(Script::Verdict(Some("ALLOW")));
        let calls = Arc::new(AtomicUsize::new(0));
        let router = counting_router(state(client.clone()), calls.clone(), "ViewPhoto");

        let (status, _) = send(router, Method::GET, "/items/%C3%28").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(client.calls(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let client = ScriptedClient::new(Script::Verdict(Some("ALLOW")));
        let router = create_router(state(client));

        let mut seen = Vec::new();
        for _ in 0..2 {
            let request = Request::builder()
                .uri("/api/v1/photo/1")
                .body(Body::empty())
                .unwrap();
            let response = router.clone().oneshot(request).await.unwrap();
            let id = response.headers().get(REQUEST_ID_HEADER).cloned().unwrap();
            seen.push(id);
        }
        assert_ne!(seen[0], seen[1]);

        let request = Request::builder()
            .uri("/api/v1/health")
            .header(REQUEST_ID_HEADER, "upstream-7")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "upstream-7");
    }

    fn cedar_state() -> AppState {
        state(Arc::new(CedarDecisionClient::from_policies(POLICIES).unwrap()))
    }

    #[tokio::test]
    async fn test_end_to_end_view_own_photo() {
        let (status, body) = send(create_router(cedar_state()), Method::GET, "/api/v1/photo/1").await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["image_url"], "https://dummy.com/1/photo.jpg");
    }

    #[tokio::test]
    async fn test_end_to_end_view_denials() {
        for id in ["3", "99"] {
            let uri = format!("/api/v1/photo/{}", id);
            let (status, _) = send(create_router(cedar_state()), Method::GET, &uri).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "photo {}", id);
        }
    }

    #[tokio::test]
    async fn test_end_to_end_upload() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/photo/upload")
            .body(Body::from(vec![0u8; 16]))
            .unwrap();
        let response = create_router(cedar_state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "upload photo successful!");
        assert_eq!(body["size"], 16);
    }

    #[tokio::test]
    async fn test_health_is_not_gated() {
        let client = ScriptedClient::new(Script::Fail);
        let (status, body) = send(create_router(state(client.clone())), Method::GET, "/api/v1/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(client.calls(), 0);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["decision_engine"], "scripted");
    }
}
