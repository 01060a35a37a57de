use std::collections::BTreeMap;

use assert_matches::assert_matches;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use triage_cell::{
    ClassificationRequest, GeminiClassifier, SeverityRank, TriageClassifier, TriageError,
};

const GENERATE_PATH: &str = "/models/gemini-test:generateContent";

fn config(base_url: &str, api_key: &str) -> AppConfig {
    AppConfig {
        gemini_api_key: api_key.to_string(),
        gemini_model: "gemini-test".to_string(),
        gemini_base_url: base_url.to_string(),
        ..AppConfig::default()
    }
}

fn malaria_request() -> ClassificationRequest {
    let mut symptoms = BTreeMap::new();
    symptoms.insert("fever".to_string(), "39C for two days".to_string());
    symptoms.insert("travel".to_string(), "Returned from Kano last week".to_string());
    ClassificationRequest {
        disease: "Malaria".to_string(),
        symptoms,
        additional_notes: Some("Has had malaria before".to_string()),
    }
}

fn candidate(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })
}

#[tokio::test]
async fn test_classify_parses_model_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({"generationConfig": {"temperature": 0.0, "topK": 1}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(
            "```json\n{\"suggestedDiagnosis\": \"Probable uncomplicated malaria\", \"severityRank\": \"Mild\", \"managementTips\": [\"Get a malaria test\"], \"reasoning\": \"Fever with travel\"}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let classifier = GeminiClassifier::new(&config(&server.uri(), "test-key"));
    let output = assert_ok!(classifier.classify(&malaria_request()).await);

    assert_eq!(output.severity_rank, SeverityRank::Mild);
    assert_eq!(output.suggested_diagnosis, "Probable uncomplicated malaria");
    assert_eq!(output.management_tips, vec!["Get a malaria test"]);
    assert_eq!(classifier.model_version(), "gemini-test");
}

#[tokio::test]
async fn test_unparseable_output_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("not json at all")))
        .mount(&server)
        .await;

    let classifier = GeminiClassifier::new(&config(&server.uri(), "test-key"));
    let output = assert_ok!(classifier.classify(&malaria_request()).await);

    assert_eq!(output.severity_rank, SeverityRank::Mild);
    assert_eq!(output.management_tips.len(), 3);
}

#[tokio::test]
async fn test_api_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"error": {"message": "quota exceeded"}})),
        )
        .mount(&server)
        .await;

    let classifier = GeminiClassifier::new(&config(&server.uri(), "test-key"));
    let result = classifier.classify(&malaria_request()).await;

    assert_matches!(result, Err(TriageError::ClassifierUnavailable(ref msg)) if msg == "quota exceeded");
}

#[tokio::test]
async fn test_empty_candidates_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let classifier = GeminiClassifier::new(&config(&server.uri(), "test-key"));
    assert_matches!(
        classifier.classify(&malaria_request()).await,
        Err(TriageError::ClassifierUnavailable(_))
    );
}

#[tokio::test]
async fn test_missing_key_and_unknown_disease_fail_without_calling_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let unconfigured = GeminiClassifier::new(&config(&server.uri(), ""));
    assert_matches!(
        unconfigured.classify(&malaria_request()).await,
        Err(TriageError::ClassifierNotConfigured)
    );

    let classifier = GeminiClassifier::new(&config(&server.uri(), "test-key"));
    let mut request = malaria_request();
    request.disease = "Typhoid".to_string();
    assert_matches!(
        classifier.classify(&request).await,
        Err(TriageError::UnsupportedDisease { .. })
    );
}
