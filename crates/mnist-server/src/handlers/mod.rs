//! HTTP route handlers for the inference server.

pub mod predict;

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::{HealthResponse, ModelStatus};
use crate::ServerState;

/// Health check endpoint. Answers in degraded mode too.
pub async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let model = match state.model.is_loaded() {
        true => ModelStatus::Loaded,
        false => ModelStatus::Unavailable,
    };
    Json(HealthResponse {
        status: "ok",
        service: state.service_name.clone(),
        model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use mnist_core::{Classifier, Image, ModelHandle, ServingError, NUM_CLASSES};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TwoClass;

    impl Classifier for TwoClass {
        fn name(&self) -> &str {
            "two-class"
        }

        fn predict_proba(&self, _image: &Image) -> Result<Vec<f32>, ServingError> {
            Ok(vec![0.0, 1.0])
        }
    }

    /// Votes for the class whose index equals the first pixel scaled to 0..10.
    struct FirstPixel;

    impl Classifier for FirstPixel {
        fn name(&self) -> &str {
            "first-pixel"
        }

        fn predict_proba(&self, image: &Image) -> Result<Vec<f32>, ServingError> {
            let class = ((image.as_slice()[0] * NUM_CLASSES as f32) as usize).min(NUM_CLASSES - 1);
            let mut scores = vec![0.0; NUM_CLASSES];
            scores[class] = 1.0;
            Ok(scores)
        }
    }

    struct Failing;

    impl Classifier for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict_proba(&self, _image: &Image) -> Result<Vec<f32>, ServingError> {
            Err(ServingError::Inference("numeric error".into()))
        }
    }

    fn app(model: ModelHandle) -> axum::Router {
        crate::router(Arc::new(ServerState::new("test", model)))
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn predicted_class(body: &Value) -> u64 {
        body["predicted_class"].as_u64().expect("integer predicted_class")
    }

    #[tokio::test]
    async fn test_predict_degraded_always_succeeds() {
        let app = app(ModelHandle::unavailable("registry down"));

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let (status, body) = send(app.clone(), get("/predict")).await;
            assert_eq!(status, StatusCode::OK);
            let class = predicted_class(&body);
            assert!(class < 10);
            seen.insert(class);
        }
        assert!(seen.len() >= 5, "fallback classes too narrow: {:?}", seen);
    }

    #[tokio::test]
    async fn test_predict_loaded_uses_argmax() {
        let app = app(ModelHandle::loaded(TwoClass));

        for _ in 0..20 {
            let (status, body) = send(app.clone(), get("/predict")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "predicted_class": 1 }));
        }
    }

    #[tokio::test]
    async fn test_predict_inference_error_is_500() {
        let app = app(ModelHandle::loaded(Failing));
        let (status, body) = send(app, get("/predict")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("numeric error"));
    }

    #[tokio::test]
    async fn test_classify_uses_caller_image() {
        let app = app(ModelHandle::loaded(FirstPixel));

        let mut rows = vec![vec![0.0_f32; 28]; 28];
        rows[0][0] = 0.75;
        for _ in 0..5 {
            let (status, body) =
                send(app.clone(), post_json("/predict", json!({ "image": rows }))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(predicted_class(&body), 7);
        }
    }

    #[tokio::test]
    async fn test_classify_degraded_still_succeeds() {
        let app = app(ModelHandle::unavailable("no model"));
        let rows = vec![vec![0.5_f32; 28]; 28];
        let (status, body) = send(app, post_json("/predict", json!({ "image": rows }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(predicted_class(&body) < 10);
    }

    #[tokio::test]
    async fn test_classify_rejects_bad_shape() {
        let app = app(ModelHandle::loaded(TwoClass));

        let rows = vec![vec![0.0_f32; 28]; 3];
        let (status, body) =
            send(app.clone(), post_json("/predict", json!({ "image": rows }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("expected 28 rows"));

        let (status, body) = send(app, post_json("/predict", json!({ "pixels": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_health_reports_model_state() {
        let (status, body) = send(app(ModelHandle::unavailable("down")), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "status": "ok", "service": "test", "model": "unavailable" })
        );

        let (_, body) = send(app(ModelHandle::loaded(TwoClass)), get("/health")).await;
        assert_eq!(body["model"], "loaded");
    }
}
