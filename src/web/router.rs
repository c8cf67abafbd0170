//! Route definitions for web server.

use axum::{
    routing::{get, post},
    Router,
};

use super::{api, AppState};

/// Create the API router.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        // Commands
        .route("/commands", post(api::run_command))
        .route("/commands/parse", post(api::parse_line))
        // Instances
        .route("/instances", get(api::list_instances))
}

/// Create the full app router.
pub fn create_app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", create_api_router())
        .route("/health", get(health_check))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::store::temp_store;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn call(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn app() -> (tempfile::TempDir, Router) {
        let (dir, store) = temp_store();
        let state = AppState::new(store, Settings::default());
        (dir, create_app_router(state))
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_plain_text_is_not_a_command() {
        let (_dir, app) = app();
        let (status, body) = call(
            app,
            "POST",
            "/api/commands",
            r#"{"instance": "loja", "command": "bom dia a todos"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "isCommand": false }));
    }

    #[tokio::test]
    async fn test_usage_error_needs_no_instance() {
        let (_dir, app) = app();
        let (status, body) = call(
            app,
            "POST",
            "/api/commands",
            r##"{"instance": "nao-existe", "command": "#addnogrupo Vendas"}"##,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["command"], "addnogrupo");
        assert!(body["message"].as_str().unwrap().starts_with("Uso:"));
    }

    #[tokio::test]
    async fn test_unknown_instance() {
        let (_dir, app) = app();
        let (status, body) = call(
            app,
            "POST",
            "/api/commands",
            r##"{"instance": "nao-existe", "command": "#addnogrupo Vendas|5511"}"##,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nao-existe"));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (_dir, app) = app();
        let (status, body) = call(app, "POST", "/api/commands", "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_parse_endpoint() {
        let (_dir, app) = app();
        let (status, body) = call(
            app,
            "POST",
            "/api/commands/parse",
            r##"{"command": "#linkgrupo MeuGrupo|clipboard"}"##,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isCommand"], true);
        assert_eq!(body["command"], "#linkgrupo");
        assert_eq!(body["operation"]["operation"], "invite_link");
        assert_eq!(body["operation"]["target"], "clipboard");
    }

    #[tokio::test]
    async fn test_instances_are_masked() {
        let (_dir, store) = temp_store();
        store
            .add_instance(&crate::store::Instance::new(
                "loja",
                "Loja",
                "https://loja.uazapi.com",
                "super-secret-1234",
            ))
            .unwrap();
        let app = create_app_router(AppState::new(store, Settings::default()));

        let (status, body) = call(app, "GET", "/api/instances", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "loja");
        assert_eq!(body[0]["token"], "****1234");
    }
}
