use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    matrix, phases, potentials, product_development, profile, subphases, system, users,
};
use crate::middleware::{require_admin, require_authenticated};
use crate::state::AppState;

/// Full application router: public reads, authenticated writes and the
/// admin-only rating route, under the global layers
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    if state.config.security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/users/login", post(users::login))
        .route("/phases", get(phases::list))
        .route("/phases/:phase_id", get(phases::get))
        .route("/phases/:phase_id/subphases", get(subphases::list))
        // Same path shape as the protected /potential/:id routes
        .route("/potential/:id", get(potentials::list))
        .route("/matrix/phase/:phase_id", get(matrix::for_phase))
        .route("/profile/:phase_id", get(profile::for_phase))
        .route("/product-development-sections", get(product_development::list))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/:id", patch(users::update))
        .route("/phases/:phase_id", patch(phases::update_title))
        .route("/phases/:phase_id/subphases", post(subphases::create))
        .route(
            "/phases/:phase_id/subphases/:id",
            patch(subphases::update).delete(subphases::delete),
        )
        .route("/potential", post(potentials::create))
        .route(
            "/potential/:id",
            patch(potentials::update).delete(potentials::delete),
        )
        .route("/matrix/categories", post(matrix::create))
        .route(
            "/matrix/categories/:id",
            patch(matrix::update).delete(matrix::delete),
        )
        .route(
            "/matrix/category-titles/:phase_id",
            patch(matrix::update_category_title),
        )
        .route("/profile/:phase_id/section", post(profile::create_section))
        .route(
            "/profile/:phase_id/section/:section_id",
            patch(profile::update_section),
        )
        .route(
            "/product-development-sections/:id",
            patch(product_development::update),
        )
        .route_layer(middleware::from_fn_with_state(state, require_authenticated))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/potential/:id/rating", post(potentials::rate))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, require_authenticated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthUser, Claims, Role};
    use crate::testing::{assert_contiguous, bearer, test_state, token_service, MemoryOrderedStore};
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<String>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn app_with_phases(phases: impl IntoIterator<Item = i64>) -> (Router, MemoryOrderedStore) {
        let store = MemoryOrderedStore::with_phases(phases);
        (app(test_state(store.clone())), store)
    }

    #[tokio::test]
    async fn missing_token_is_forbidden() {
        let (app, store) = app_with_phases([1]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/phases/1/subphases",
            None,
            Some(json!({ "name": "Research" })),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "A token is required for authentication");
        assert_eq!(store.transactions_started(), 0);
    }

    #[tokio::test]
    async fn malformed_and_expired_tokens_get_the_same_401() {
        let (app, _) = app_with_phases([1]);
        let expired = token_service()
            .sign(&Claims::new(
                AuthUser {
                    user_id: 1,
                    role: Role::Admin,
                },
                chrono::Utc::now() - chrono::Duration::hours(3),
            ))
            .unwrap();

        let mut messages = Vec::new();
        for token in ["Bearer not-a-token".to_string(), format!("Bearer {}", expired)] {
            let (status, body) = send(
                &app,
                Method::DELETE,
                "/phases/1/subphases/1",
                Some(token),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            messages.push(body["message"].clone());
        }
        assert_eq!(messages[0], "Invalid Token");
        assert_eq!(messages[0], messages[1]);
    }

    #[tokio::test]
    async fn rating_requires_admin() {
        let (app, _) = app_with_phases([1]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/potential/3/rating",
            Some(bearer(4, Role::User)),
            Some(json!({ "rating": 4 })),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Forbidden: Admins only.");
    }

    #[tokio::test]
    async fn admin_rating_out_of_range_is_rejected_before_the_store() {
        let (app, _) = app_with_phases([1]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/potential/3/rating",
            Some(bearer(1, Role::Admin)),
            Some(json!({ "rating": 7 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Rating must be between 1 and 5.");
    }

    #[tokio::test]
    async fn users_cannot_update_someone_else() {
        let (app, _) = app_with_phases([1]);
        let (status, body) = send(
            &app,
            Method::PATCH,
            "/users/5",
            Some(bearer(4, Role::User)),
            Some(json!({ "username": "a", "password": "b", "newPassword": "c" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "You are not allowed to update this resource");
    }

    #[tokio::test]
    async fn credential_update_without_new_fields_is_bad_request() {
        let (app, _) = app_with_phases([1]);
        let (status, _) = send(
            &app,
            Method::PATCH,
            "/users/4",
            Some(bearer(4, Role::User)),
            Some(json!({ "username": "a", "password": "b" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn subphase_lifecycle_keeps_order_contiguous() {
        let (app, store) = app_with_phases([1]);
        let token = || Some(bearer(2, Role::User));

        let mut ids = Vec::new();
        for name in ["Research", "Prototype", "Pilot"] {
            let (status, body) = send(
                &app,
                Method::POST,
                "/phases/1/subphases",
                token(),
                Some(json!({ "name": name, "details": [format!("{} notes", name)] })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["success"], true);
            assert_eq!(body["data"]["message"], "Subphase created successfully");
            ids.push(body["data"]["id"].as_i64().unwrap());
        }

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/phases/1/subphases/{}", ids[0]),
            token(),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, "/phases/1/subphases", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Prototype", "Pilot"]);
        assert_eq!(body["data"][0]["order_number"], 1);
        assert_eq!(body["data"][1]["order_number"], 2);
        assert_eq!(body["data"][0]["details"], json!(["Prototype notes"]));

        assert_contiguous(&store_rows(&store).await);
    }

    async fn store_rows(store: &MemoryOrderedStore) -> Vec<crate::ordering::Subphase> {
        use crate::ordering::OrderedStore;
        store.list(1).await.unwrap()
    }

    #[tokio::test]
    async fn subphase_update_validates_and_reports_missing_rows() {
        let (app, _) = app_with_phases([1]);
        let token = || Some(bearer(2, Role::User));

        let (status, body) = send(
            &app,
            Method::PATCH,
            "/phases/1/subphases/99",
            token(),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No fields provided for update.");

        let (status, body) = send(
            &app,
            Method::PATCH,
            "/phases/1/subphases/99",
            token(),
            Some(json!({ "name": "Renamed" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Subphase not found");
    }

    #[tokio::test]
    async fn appending_to_an_unknown_phase_is_not_found() {
        let (app, _) = app_with_phases([1]);
        let (status, _) = send(
            &app,
            Method::POST,
            "/phases/42/subphases",
            Some(bearer(2, Role::User)),
            Some(json!({ "name": "Orphan" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mistyped_body_is_a_bad_request_in_the_error_shape() {
        let (app, store) = app_with_phases([1]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/phases/1/subphases",
            Some(bearer(2, Role::User)),
            Some(json!({ "name": 5 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON body"));
        assert_eq!(store.transactions_started(), 0);
    }

    #[tokio::test]
    async fn body_without_json_content_type_is_a_bad_request() {
        let (app, _) = app_with_phases([1]);
        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/phases/1/subphases/1")
            .header(header::AUTHORIZATION, bearer(2, Role::User))
            .body(Body::from(r#"{"name":"Renamed"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn truncated_login_body_is_a_bad_request() {
        let (app, _) = app_with_phases([1]);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/users/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username":"ana""#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn root_banner_is_public() {
        let (app, _) = app_with_phases([1]);
        let (status, body) = send(&app, Method::GET, "/", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Phase Matrix API");
    }
}
