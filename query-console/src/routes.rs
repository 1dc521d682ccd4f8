//! 路由模块

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use common::middleware::{admin_gate_middleware, SharedAdminGate};

use crate::handlers;
use crate::state::AppState;

pub fn router(gate: SharedAdminGate) -> Router<AppState> {
    let admin = Router::new()
        .route("/admin", get(handlers::admin_page))
        .route("/save", post(handlers::save_details))
        .route("/api/admin/connections", post(handlers::register_connection))
        .route_layer(middleware::from_fn_with_state(gate, admin_gate_middleware));

    Router::new()
        .route("/", get(handlers::query_page))
        .route("/fetch", post(handlers::fetch_results))
        .route("/api/connections", get(handlers::list_connections))
        .route("/api/query", post(handlers::execute_query))
        .route("/api/health", get(handlers::health_check))
        .merge(admin)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use common::config::AppConfig;

    use crate::create_router;
    use crate::state::AppState;
    use crate::test_support::{open_sqlite, seed_sms, sms_target, sqlite_dsn};
    use sqlx::Connection;

    const SECRET: &str = "s3cret";
    const FORM: &str = "application/x-www-form-urlencoded";

    struct TestApp {
        tmp: TempDir,
        state: AppState,
        router: Router,
        dsn: String,
    }

    impl TestApp {
        async fn new(rows: i64) -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let db_path = tmp.path().join("sms.db");
            seed_sms(&db_path, rows).await;

            let config = AppConfig {
                connections_file: tmp.path().join("connections.json"),
                admin_password: Some(SECRET.to_string()),
                query_target: sms_target(),
                ..AppConfig::default()
            };
            let state = AppState::new(config).await.unwrap();
            let router = create_router(state.clone());
            Self {
                dsn: sqlite_dsn(&db_path),
                tmp,
                state,
                router,
            }
        }

        async fn register_primary(&self) {
            self.state.registry.save("primary", &self.dsn).await.unwrap();
        }

        async fn send(&self, req: Request<Body>) -> Response {
            self.router.clone().oneshot(req).await.unwrap()
        }
    }

    fn form(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, FORM)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_query_page_with_empty_registry() {
        let app = TestApp::new(0).await;
        let response = app.send(get("/")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"action="/fetch""#));
        assert!(!html.contains("<option"));
    }

    #[tokio::test]
    async fn test_admin_page_requires_credential() {
        let app = TestApp::new(0).await;

        let response = app.send(get("/admin")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.send(get("/admin?password=wrong")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.send(get("/admin?password=s3cret")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"action="/save?password=s3cret""#));
    }

    #[tokio::test]
    async fn test_admin_page_with_bearer_points_to_api() {
        let app = TestApp::new(0).await;
        let request = Request::get("/admin")
            .header(header::AUTHORIZATION, format!("Bearer {}", SECRET))
            .body(Body::empty())
            .unwrap();

        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(!html.contains("<form"));
        assert!(html.contains("/api/admin/connections"));
    }

    #[tokio::test]
    async fn test_save_redirects_and_preselects() {
        let app = TestApp::new(0).await;

        let response = app
            .send(form("/save?password=s3cret", "name=primary&dsn=sqlite%3Aa.db"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert_eq!(app.state.registry.resolve("primary").await.unwrap(), "sqlite:a.db");

        let html = body_text(app.send(get("/")).await).await;
        assert!(html.contains(r#"<option value="primary" selected>"#));
        assert!(!html.contains("sqlite:a.db"));

        let persisted = std::fs::read_to_string(app.tmp.path().join("connections.json")).unwrap();
        assert!(persisted.contains(r#""primary": "sqlite:a.db""#));
    }

    #[tokio::test]
    async fn test_save_rejects_empty_fields() {
        let app = TestApp::new(0).await;

        let response = app.send(form("/save?password=s3cret", "name=&dsn=sqlite%3Aa.db")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Name and DSN are required");
        assert_eq!(app.state.registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_save_without_credential_changes_nothing() {
        let app = TestApp::new(0).await;

        let response = app.send(form("/save", "name=primary&dsn=sqlite%3Aa.db")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(app.state.registry.connection_count().await, 0);
        assert!(!app.tmp.path().join("connections.json").exists());
    }

    #[tokio::test]
    async fn test_fetch_recent_rows() {
        let app = TestApp::new(25).await;
        app.register_primary().await;

        let response = app
            .send(form("/fetch", "database=primary&value=&executeWithoutValue=on"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        // One header row plus the capped result set.
        assert_eq!(html.matches("<tr>").count(), 21);
        assert!(html.contains("<td>25</td>"));
        assert!(!html.contains("<td>5</td>"));
    }

    #[tokio::test]
    async fn test_fetch_by_value() {
        let app = TestApp::new(6).await;
        app.register_primary().await;

        let response = app.send(form("/fetch", "database=primary&value=0711111111")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert_eq!(html.matches("<td>0711111111</td>").count(), 3);
        assert!(!html.contains("0700000000"));
    }

    #[tokio::test]
    async fn test_fetch_unknown_database() {
        let app = TestApp::new(0).await;

        let response = app.send(form("/fetch", "database=missing&value=1")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Selected database not found");
    }

    #[tokio::test]
    async fn test_fetch_connection_failure_is_generic() {
        let app = TestApp::new(0).await;
        let missing = app.tmp.path().join("nowhere").join("x.db");
        app.state
            .registry
            .save("broken", &format!("sqlite:{}?mode=ro", missing.display()))
            .await
            .unwrap();

        let response = app.send(form("/fetch", "database=broken&executeWithoutValue=on")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Failed to connect to the database");
    }

    #[tokio::test]
    async fn test_fetch_rejects_get() {
        let app = TestApp::new(0).await;
        let response = app.send(get("/fetch")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_api_query_envelope() {
        let app = TestApp::new(25).await;
        app.register_primary().await;

        let response = app
            .send(json_post(
                "/api/query",
                json!({ "connection": "primary", "skip_filter": true }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["row_count"], 20);
        assert_eq!(body["data"]["skipped_rows"], 0);
        assert_eq!(body["data"]["rows"][0]["column1"], "25");
        assert_eq!(body["meta"]["service"], "query-console");
    }

    #[tokio::test]
    async fn test_api_query_reports_skipped_rows() {
        let app = TestApp::new(0).await;
        let path = app.tmp.path().join("narrow.db");
        let mut conn = open_sqlite(&path).await;
        sqlx::query("CREATE TABLE sms (ID INTEGER PRIMARY KEY, MOBILE TEXT)")
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query("INSERT INTO sms (ID, MOBILE) VALUES (1, '0700000000'), (2, '0700000000')")
            .execute(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();
        app.state.registry.save("narrow", &sqlite_dsn(&path)).await.unwrap();

        let response = app
            .send(json_post("/api/query", json!({ "connection": "narrow", "skip_filter": true })))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["row_count"], 0);
        assert_eq!(body["data"]["skipped_rows"], 2);
    }

    #[tokio::test]
    async fn test_api_query_errors() {
        let app = TestApp::new(0).await;

        let response = app.send(json_post("/api/query", json!({ "connection": "" }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");

        let response = app
            .send(json_post("/api/query", json!({ "connection": "missing", "value": "1" })))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["message"], "Selected database not found");
    }

    #[tokio::test]
    async fn test_api_register_and_list() {
        let app = TestApp::new(0).await;

        let register = |auth: Option<&str>| {
            let mut builder = Request::post("/api/admin/connections")
                .header(header::CONTENT_TYPE, "application/json");
            if let Some(token) = auth {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            builder
                .body(Body::from(json!({ "name": "reporting", "dsn": "sqlite:r.db" }).to_string()))
                .unwrap()
        };

        let response = app.send(register(None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.send(register(Some(SECRET))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["connections"], json!(["reporting"]));
        assert_eq!(body["data"]["selected"], "reporting");

        let response = app.send(get("/api/connections")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("reporting"));
        assert!(!text.contains("sqlite:r.db"));
    }

    #[tokio::test]
    async fn test_health_and_openapi() {
        let app = TestApp::new(0).await;
        app.register_primary().await;

        let body = body_json(app.send(get("/api/health")).await).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["connections"], 1);

        let response = app.send(get("/api-docs/openapi.json")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert!(doc["paths"]["/api/query"].is_object());
        assert!(doc["paths"]["/api/admin/connections"].is_object());
    }
}
