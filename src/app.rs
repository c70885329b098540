use std::net::SocketAddr;

use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::{self, require_auth},
    config::AppConfig,
    dashboard,
    state::AppState,
    tasks, transactions, users,
};

pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/user", users::router())
        .nest("/task", tasks::router())
        .nest("/transaction", transactions::router())
        .nest("/dashboard", dashboard::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest(
            "/api",
            Router::new()
                .nest("/auth", auth::router())
                .merge(protected)
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::jwt::{SessionKeys, SessionPayload},
        users::Role,
    };
    use axum::{
        body::Body,
        extract::FromRef,
        http::{header, Method, Request, StatusCode},
    };
    use jsonwebtoken::{encode, Header};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn request(method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut b = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            b = b.header(header::AUTHORIZATION, auth);
        }
        match body {
            Some(v) => b
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => b.body(Body::empty()).unwrap(),
        }
    }

    fn bearer(state: &AppState, role: Role) -> String {
        let token = SessionKeys::from_ref(state)
            .sign(&SessionPayload {
                id: 1,
                email: "ana@example.com".into(),
                role,
            })
            .unwrap();
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn health() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(request(Method::GET, "/api/health", None, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let state = AppState::fake();
        for (method, uri) in [
            (Method::GET, "/api/user/getAll"),
            (Method::GET, "/api/user/getEmail?email=a@b.co"),
            (Method::POST, "/api/user/create"),
            (Method::PATCH, "/api/user/update/1"),
            (Method::DELETE, "/api/user/delete/1"),
            (Method::GET, "/api/task/getAll"),
            (Method::POST, "/api/task/create"),
            (Method::PATCH, "/api/task/update/1"),
            (Method::DELETE, "/api/task/delete/1"),
            (Method::GET, "/api/transaction/getAll"),
            (Method::POST, "/api/transaction/create"),
            (Method::GET, "/api/dashboard/summary"),
        ] {
            let app = build_app(state.clone());
            let (status, body) = send(app, request(method, uri, None, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["message"], "Unauthorized", "{uri}");
        }
    }

    #[tokio::test]
    async fn malformed_header_is_rejected() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            app,
            request(Method::GET, "/api/task/getAll", Some("Basic abc"), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid authorization format");
    }

    #[tokio::test]
    async fn expired_or_forged_token_is_rejected() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            app,
            request(Method::GET, "/api/task/getAll", Some("Bearer a.b.c"), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn token_with_wrong_payload_shape() {
        let state = AppState::fake();
        let keys = SessionKeys::from_ref(&state);
        let exp = time::OffsetDateTime::now_utc().unix_timestamp() + 600;
        let token = encode(
            &Header::default(),
            &json!({
                "sub": "someone", "exp": exp,
                "iss": keys.issuer, "aud": keys.audience,
            }),
            &keys.encoding,
        )
        .unwrap();

        let app = build_app(state);
        let (status, body) = send(
            app,
            request(
                Method::GET,
                "/api/dashboard/summary",
                Some(&format!("Bearer {token}")),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token payload");
    }

    #[tokio::test]
    async fn invalid_task_body_fails_before_the_database() {
        let state = AppState::fake();
        let auth = bearer(&state, Role::User);
        let app = build_app(state);
        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/api/task/create",
                Some(&auth),
                Some(json!({ "nameTask": "", "statusTask": "LATER" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(body["errors"][0]["field"], "statusTask");
    }

    #[tokio::test]
    async fn empty_task_name_is_a_field_error() {
        let state = AppState::fake();
        let auth = bearer(&state, Role::User);
        let app = build_app(state);
        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/api/task/create",
                Some(&auth),
                Some(json!({ "nameTask": "", "statusTask": "PENDING" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(body["errors"][0]["field"], "nameTask");
        assert_eq!(body["errors"][0]["message"], "Name task is required");
    }

    #[tokio::test]
    async fn non_admin_create_is_forbidden_before_body_checks() {
        let state = AppState::fake();
        let auth = bearer(&state, Role::User);
        let app = build_app(state);
        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/api/user/create",
                Some(&auth),
                Some(json!({ "email": "not-an-email" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn non_positive_price_is_rejected() {
        let state = AppState::fake();
        let auth = bearer(&state, Role::User);
        let app = build_app(state);
        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/api/transaction/create",
                Some(&auth),
                Some(json!({
                    "nameTransaction": "Coffee",
                    "price": 0,
                    "typeTransaction": "EXPENSE",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "price");
        assert_eq!(body["errors"][0]["message"], "Price must be greater than 0");
    }

    #[tokio::test]
    async fn non_numeric_id_is_rejected() {
        let state = AppState::fake();
        let auth = bearer(&state, Role::User);
        let app = build_app(state);
        let (status, body) = send(
            app,
            request(Method::DELETE, "/api/task/delete/abc", Some(&auth), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid id");
    }

    #[tokio::test]
    async fn plain_users_cannot_list_users() {
        let state = AppState::fake();
        let auth = bearer(&state, Role::User);
        let app = build_app(state);
        let (status, body) = send(
            app,
            request(Method::GET, "/api/user/getAll", Some(&auth), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Forbidden");
    }

    #[tokio::test]
    async fn register_validates_input() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "name": "Ana", "email": "nope", "password": "short" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn register_rejects_unparseable_json() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn malformed_activation_token() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(request(Method::GET, "/api/auth/activate/xyz", None, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unreachable_database_is_a_generic_500() {
        let state = AppState::fake();
        let auth = bearer(&state, Role::User);
        let app = build_app(state);
        let (status, body) = send(
            app,
            request(Method::GET, "/api/task/getAll", Some(&auth), None),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Internal Server Error" }));
    }
}
