//! Invoice API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the invoice API router.
///
/// CORS is open: the browser front-end calls the API from its own origin.
pub fn invoice_api_router(ctx: ApiContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/process_invoice", post(endpoints::invoices::process))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::pipeline::orchestrator::test_support::{invoice, ScriptedSkills};
    use crate::pipeline::{InvoiceOrchestrator, ReferenceStore, WorkflowDefinition};

    fn app_with(skills: ScriptedSkills) -> Router {
        let orchestrator = InvoiceOrchestrator::new(
            Arc::new(WorkflowDefinition::invoice().unwrap()),
            Arc::new(ReferenceStore::builtin()),
            Arc::new(skills),
        );
        invoice_api_router(ApiContext::new(Arc::new(orchestrator)))
    }

    fn app() -> Router {
        app_with(ScriptedSkills::new(Ok(invoice("INV-2024-001", 250.00, "USD"))))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/process_invoice")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn process_invoice_returns_full_run_state() {
        let response = app()
            .oneshot(post_json(
                r#"{"invoice_content": "Invoice #INV-2024-001\nTOTAL: $250.00 USD", "credential": "sk-test"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["detected_language"], "English");
        assert_eq!(json["needs_translation"], false);
        assert_eq!(json["extracted"]["status"], "structured");
        assert_eq!(json["extracted"]["value"]["invoice_number"], "INV-2024-001");
        assert_eq!(json["translated_text"]["status"], "pass_through");
        assert_eq!(json["validation_outcome"]["status"], "success");
        assert_eq!(json["summary"]["status"], "completed");
        assert!(json["run_id"].is_string());
    }

    #[tokio::test]
    async fn response_never_contains_credential() {
        let response = app()
            .oneshot(post_json(
                r#"{"invoice_content": "Invoice #INV-2024-001", "credential": "sk-very-secret"}"#,
            ))
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("sk-very-secret"));
        assert!(!text.contains("credential"));
    }

    #[tokio::test]
    async fn openai_api_key_is_accepted_as_credential() {
        let response = app()
            .oneshot(post_json(
                r#"{"invoice_content": "Invoice #INV-2024-001", "openai_api_key": "sk-test"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_invoice_content_is_400() {
        let response = app()
            .oneshot(post_json(r#"{"credential": "sk-test"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("invoice_content"));
    }

    #[tokio::test]
    async fn whitespace_only_invoice_content_is_400() {
        let response = app()
            .oneshot(post_json(r#"{"invoice_content": " \n\t ", "credential": "sk-test"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_credential_is_400() {
        let response = app()
            .oneshot(post_json(r#"{"invoice_content": "Invoice #1", "credential": "  "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("credential"));
    }

    #[tokio::test]
    async fn invalid_json_is_400() {
        let response = app().oneshot(post_json("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_invoice_reports_failed_validation_with_200() {
        let response = app_with(ScriptedSkills::new(Ok(invoice("INV-9999", 100.00, "USD"))))
            .oneshot(post_json(
                r#"{"invoice_content": "Invoice #INV-9999", "credential": "sk-test"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["validation_outcome"]["status"], "failed");
        assert_eq!(
            json["validation_outcome"]["messages"][0],
            "INVOICE NOT FOUND: INV-9999 not in enterprise system."
        );
    }

    #[tokio::test]
    async fn health_reports_reference_records() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["reference_records"], 3);
        assert_eq!(json["version"], crate::config::APP_VERSION);
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/process_invoice")
            .header("Origin", "http://localhost:3000")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
