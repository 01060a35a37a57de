use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tokio_test::assert_ok;
use tower::ServiceExt;
use uuid::Uuid;

use patient_cell::{
    create_patient_router, unique_indexes, CreatePatientRequest, PatientError, PatientSearchQuery,
    PatientService, UpdatePatientRequest,
};
use shared_utils::test_utils::TestConfig;

fn service() -> PatientService {
    let (state, _) = TestConfig::default().memory_state(unique_indexes());
    PatientService::new(state.store.clone())
}

fn request(email: &str) -> CreatePatientRequest {
    CreatePatientRequest {
        name: "Amaka Obi".to_string(),
        email: email.to_string(),
        phone: Some("+2348011112222".to_string()),
        age: Some(34),
        gender: Some("female".to_string()),
        medical_history: vec!["asthma".to_string()],
    }
}

#[tokio::test]
async fn test_create_patient_normalizes_email() {
    let service = service();

    let patient = assert_ok!(service.create_patient(request("  Amaka@Example.com ")).await);
    assert_eq!(patient.email, "amaka@example.com");
    assert_eq!(patient.medical_history, vec!["asthma"]);
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let service = service();
    service.create_patient(request("amaka@example.com")).await.unwrap();

    let result = service.create_patient(request("AMAKA@example.com")).await;
    assert_matches!(result, Err(PatientError::EmailAlreadyExists { .. }));
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let service = service();

    let result = service.create_patient(request("not-an-email")).await;
    assert_matches!(result, Err(PatientError::ValidationError(_)));
}

#[tokio::test]
async fn test_get_patient_errors() {
    let service = service();

    assert_matches!(service.get_patient("123").await, Err(PatientError::InvalidReference(_)));
    assert_matches!(
        service.get_patient(&Uuid::new_v4().to_string()).await,
        Err(PatientError::NotFound(_))
    );
}

#[tokio::test]
async fn test_update_patient_merges_fields() {
    let service = service();
    let created = service.create_patient(request("amaka@example.com")).await.unwrap();

    let updated = service
        .update_patient(
            &created.id.to_string(),
            UpdatePatientRequest {
                age: Some(35),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.age, Some(35));
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.email, created.email);
}

#[tokio::test]
async fn test_search_by_phone_and_limit() {
    let service = service();
    for i in 0..3 {
        service
            .create_patient(request(&format!("patient{}@example.com", i)))
            .await
            .unwrap();
    }

    let all = service
        .search_patients(PatientSearchQuery {
            phone: Some("+2348011112222".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let limited = service
        .search_patients(PatientSearchQuery {
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);

    let by_email = service
        .search_patients(PatientSearchQuery {
            email: Some("patient1@example.com".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_email.len(), 1);
}

#[tokio::test]
async fn test_delete_patient_frees_the_email() {
    let service = service();
    let patient = service.create_patient(request("amaka@example.com")).await.unwrap();

    assert_ok!(service.delete_patient(&patient.id.to_string()).await);
    assert_matches!(
        service.get_patient(&patient.id.to_string()).await,
        Err(PatientError::NotFound(_))
    );
    assert_matches!(
        service.delete_patient(&patient.id.to_string()).await,
        Err(PatientError::NotFound(_))
    );
    assert_matches!(service.delete_patient("42").await, Err(PatientError::InvalidReference(_)));

    assert_ok!(service.create_patient(request("amaka@example.com")).await);
}

#[tokio::test]
async fn test_patient_routes() {
    let (state, _) = TestConfig::default().memory_state(unique_indexes());
    let app = create_patient_router(state);

    let body = json!({"name": "Tunde", "email": "tunde@example.com"});
    let create = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let duplicate = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(duplicate).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let search = Request::builder()
        .uri("/search?email=tunde@example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(search).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["name"], "Tunde");
    let id = json["data"][0]["id"].as_str().unwrap().to_string();

    for expected in [StatusCode::OK, StatusCode::NOT_FOUND] {
        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(delete).await.unwrap();
        assert_eq!(response.status(), expected);
    }
}
