use super::*;
use axum::body::to_bytes;

async fn payload_for(error: QaError) -> (StatusCode, serde_json::Value) {
    let response = error_response(&error);
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = serde_json::from_slice(&bytes).expect("payload should be JSON");
    (status, value)
}

#[tokio::test]
async fn format_errors_map_to_bad_request() {
    let (status, payload) =
        payload_for(QaError::UnsupportedFormat("bad extension".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "unsupported_format");
    assert!(payload["error"].as_str().is_some_and(|e| e.contains("bad extension")));
}

#[tokio::test]
async fn malformed_input_maps_to_bad_request() {
    let (status, payload) = payload_for(QaError::MalformedInput("no field".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "malformed_input");
}

#[tokio::test]
async fn auth_errors_map_to_unauthorized() {
    let (status, payload) = payload_for(QaError::Authentication("bad key".to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["code"], "authentication_failed");
}

#[tokio::test]
async fn transient_errors_map_to_service_unavailable() {
    let (status, payload) = payload_for(QaError::TransientService("down".to_string())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(payload["code"], "transient_service_failure");
}

#[tokio::test]
async fn rate_limit_maps_to_too_many_requests() {
    let (status, _) = payload_for(QaError::RateLimited("slow down".to_string())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn generation_errors_map_to_internal_error() {
    let (status, payload) = payload_for(QaError::Generation("model failed".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payload["code"], "generation_failed");
}
