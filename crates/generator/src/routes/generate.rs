//! `POST /generate`: photo and description in, HTML out.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;
use tracing::instrument;

use crate::claude::ClaudeError;
use crate::error::AppError;
use crate::prompt::PageRequest;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GeneratedPage {
    pub html: String,
}

/// Ask the model for a landing page and return its text as HTML.
///
/// # Errors
///
/// `400` if the image, name or features are missing; `500` carrying the
/// remote message if the completion fails or comes back empty.
#[instrument(skip_all, fields(product = tracing::field::Empty))]
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<PageRequest>, JsonRejection>,
) -> Result<Json<GeneratedPage>, AppError> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }
    tracing::Span::current().record("product", request.product_name.trim());

    let response = state.claude().chat(vec![request.to_message()]).await?;
    let html = response.text().trim().to_string();
    if html.is_empty() {
        return Err(ClaudeError::EmptyResponse.into());
    }

    tracing::info!(bytes = html.len(), "Landing page generated");
    Ok(Json(GeneratedPage { html }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::claude::ClaudeClient;
    use crate::config::ClaudeConfig;
    use crate::routes::app;
    use crate::state::AppState;

    fn state(base_url: &str) -> AppState {
        let config = ClaudeConfig {
            api_key: SecretString::from("sk-ant-test"),
            model: "claude-test".to_string(),
            max_tokens: 512,
        };
        AppState::new(ClaudeClient::with_base_url(&config, base_url).expect("client"))
    }

    fn post(body: &Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/generate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    fn valid() -> Value {
        json!({
            "imageBase64": "data:image/png;base64,AAAA",
            "productName": "Lamp",
            "productFeatures": "Bright",
            "productPrice": "19.99"
        })
    }

    #[tokio::test]
    async fn test_generate_returns_trimmed_html() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "model": "claude-test",
                "stop_reason": "end_turn",
                "content": [{"type": "text", "text": "\n  <!DOCTYPE html><html></html>\n"}],
                "usage": {"input_tokens": 1, "output_tokens": 1}
            })))
            .mount(&server)
            .await;

        let response = app(state(&server.uri()))
            .oneshot(post(&valid()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["html"],
            "<!DOCTYPE html><html></html>"
        );
    }

    #[tokio::test]
    async fn test_generate_rejects_missing_fields_without_calling_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let response = app(state(&server.uri()))
            .oneshot(post(&json!({"productName": "Lamp"})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(
            body["error"],
            "Missing required fields: imageBase64, productFeatures"
        );
    }

    #[tokio::test]
    async fn test_generate_surfaces_remote_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            })))
            .mount(&server)
            .await;

        let response = app(state(&server.uri()))
            .oneshot(post(&valid()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error = json_body(response).await["error"]
            .as_str()
            .expect("error string")
            .to_string();
        assert!(error.contains("Overloaded"));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "model": "claude-test",
                "stop_reason": "end_turn",
                "content": [{"type": "text", "text": "   "}],
                "usage": {"input_tokens": 1, "output_tokens": 1}
            })))
            .mount(&server)
            .await;

        let response = app(state(&server.uri()))
            .oneshot(post(&valid()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health_and_preflight() {
        let router = app(state("http://127.0.0.1:9"));

        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/generate")
                    .header("origin", "https://shop.example")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }
}
