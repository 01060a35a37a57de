use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use futures::future::join_all;
use serde_json::{json, Value};
use tokio_test::assert_ok;
use tower::ServiceExt;
use uuid::Uuid;

use hospital_cell::{CreateHospitalRequest, HospitalDirectory};
use hospital_patient_cell::{
    create_hospital_patient_router, unique_indexes, CodeSource, EnrollmentLedger,
    HospitalPatientError, HospitalSummary, QueuePosition, WaitQueue, WaitStatus,
};
use shared_database::RecordStore;
use shared_utils::test_utils::TestConfig;

/// Hands out a fixed list of codes, repeating the last one.
struct ScriptedCodes(Mutex<VecDeque<String>>);

impl ScriptedCodes {
    fn new(codes: &[&str]) -> Arc<Self> {
        Arc::new(Self(Mutex::new(codes.iter().map(|c| c.to_string()).collect())))
    }
}

impl CodeSource for ScriptedCodes {
    fn next_code(&self) -> String {
        let mut codes = self.0.lock().unwrap();
        if codes.len() > 1 {
            codes.pop_front().unwrap()
        } else {
            codes.front().cloned().unwrap()
        }
    }
}

fn store(config: &TestConfig) -> Arc<dyn RecordStore> {
    let (state, _) = config.memory_state(unique_indexes());
    state.store.clone()
}

async fn hospital(store: &Arc<dyn RecordStore>, name: &str) -> String {
    HospitalDirectory::new(store.clone())
        .create_hospital(CreateHospitalRequest {
            name: name.to_string(),
            address: "Ikeja, Lagos".to_string(),
            reg_no: None,
        })
        .await
        .unwrap()
        .id
        .to_string()
}

fn queue_for(store: &Arc<dyn RecordStore>, retries: u32) -> WaitQueue {
    WaitQueue::new(store.clone(), EnrollmentLedger::new(store.clone(), 20), retries)
}

#[tokio::test]
async fn test_enrollment_scenario_across_hospitals() {
    let store = store(&TestConfig::default());
    let h1 = hospital(&store, "H1").await;
    let h2 = hospital(&store, "H2").await;
    let ledger = EnrollmentLedger::new(store.clone(), 20);

    let first = assert_ok!(ledger.enroll(&h1, "+2348011112222").await);
    assert_eq!(first.patient_code.len(), 9);
    assert!(first.full_name.is_none());

    let again = ledger.enroll(&h1, "+2348011112222").await;
    assert_matches!(again, Err(HospitalPatientError::AlreadyEnrolled { .. }));

    let elsewhere = assert_ok!(ledger.enroll(&h2, "+2348011112222").await);
    assert_ne!(elsewhere.patient_code, first.patient_code);
}

#[tokio::test]
async fn test_enroll_requires_existing_hospital() {
    let store = store(&TestConfig::default());
    let ledger = EnrollmentLedger::new(store, 20);

    assert_matches!(
        ledger.enroll("not-a-uuid", "+2348000000000").await,
        Err(HospitalPatientError::InvalidReference(_))
    );
    assert_matches!(
        ledger.enroll(&Uuid::new_v4().to_string(), "+2348000000000").await,
        Err(HospitalPatientError::HospitalNotFound(_))
    );
}

#[tokio::test]
async fn test_enroll_retries_colliding_codes() {
    let store = store(&TestConfig::default());
    let h1 = hospital(&store, "H1").await;

    let first = EnrollmentLedger::with_code_source(store.clone(), 5, ScriptedCodes::new(&["AAAAAAAAA"]));
    first.enroll(&h1, "+2348000000001").await.unwrap();

    let second = EnrollmentLedger::with_code_source(
        store.clone(),
        5,
        ScriptedCodes::new(&["AAAAAAAAA", "AAAAAAAAA", "BBBBBBBBB"]),
    );
    let record = second.enroll(&h1, "+2348000000002").await.unwrap();
    assert_eq!(record.patient_code, "BBBBBBBBB");
}

#[tokio::test]
async fn test_enroll_gives_up_when_codes_keep_colliding() {
    let store = store(&TestConfig::default());
    let h1 = hospital(&store, "H1").await;
    let ledger = EnrollmentLedger::with_code_source(store.clone(), 3, ScriptedCodes::new(&["AAAAAAAAA"]));
    ledger.enroll(&h1, "+2348000000001").await.unwrap();

    let result = ledger.enroll(&h1, "+2348000000002").await;
    assert_matches!(result, Err(HospitalPatientError::CodeSpaceExhausted { attempts: 3 }));
}

#[tokio::test]
async fn test_patient_codes_unique_across_hospitals() {
    let store = store(&TestConfig::default());
    let ledger = EnrollmentLedger::new(store.clone(), 20);

    let mut codes = HashSet::new();
    for h in 0..3 {
        let hospital_id = hospital(&store, &format!("Hospital {}", h)).await;
        for p in 0..20 {
            let record = ledger
                .enroll(&hospital_id, &format!("+23480{:08}", p))
                .await
                .unwrap();
            assert!(codes.insert(record.patient_code));
        }
    }
    assert_eq!(codes.len(), 60);
}

#[tokio::test]
async fn test_lookup_and_list_newest_first() {
    let store = store(&TestConfig::default());
    let h1 = hospital(&store, "H1").await;
    let ledger = EnrollmentLedger::new(store.clone(), 20);

    let older = ledger.enroll(&h1, "+2348000000001").await.unwrap();
    let newer = ledger.enroll(&h1, "+2348000000002").await.unwrap();

    let found = ledger.lookup_by_code(&older.patient_code.to_lowercase()).await.unwrap();
    assert_eq!(found.id, older.id);
    assert_matches!(
        ledger.lookup_by_code("ZZZZZZZZZ").await,
        Err(HospitalPatientError::PatientCodeNotFound(_))
    );

    let listed = ledger.list_for_hospital(&h1).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].registered_at >= listed[1].registered_at);
    assert!(listed.iter().any(|r| r.id == newer.id));

    assert_matches!(
        ledger.list_for_hospital("bogus").await,
        Err(HospitalPatientError::InvalidReference(_))
    );
}

#[tokio::test]
async fn test_lookup_carries_hospital_summary() {
    let config = TestConfig::default();
    let (state, memory) = config.memory_state(unique_indexes());
    let store = state.store.clone();
    let h1 = hospital(&store, "Mercy Care").await;
    let ledger = EnrollmentLedger::new(store.clone(), 20);
    let record = ledger.enroll(&h1, "+2348000000009").await.unwrap();

    let view = assert_ok!(ledger.lookup_with_hospital(&record.patient_code).await);
    assert_eq!(view.record, record);
    assert_eq!(
        view.hospital,
        Some(HospitalSummary {
            name: "Mercy Care".to_string(),
            address: "Ikeja, Lagos".to_string(),
        })
    );

    memory.simulate_outage(hospital_cell::HOSPITALS);
    let view = assert_ok!(ledger.lookup_with_hospital(&record.patient_code).await);
    assert_eq!(view.record.id, record.id);
    assert_eq!(view.hospital, None);
    let body = serde_json::to_value(&view).unwrap();
    assert!(body.get("hospital").is_none());
    assert_eq!(body["patient_code"], record.patient_code.as_str());
}

#[tokio::test]
async fn test_join_backfills_name_and_rejects_second_waiting_entry() {
    let store = store(&TestConfig::default());
    let h1 = hospital(&store, "H1").await;
    let ledger = EnrollmentLedger::new(store.clone(), 20);
    let queue = queue_for(&store, 10);

    let record = ledger.enroll(&h1, "+2348011112222").await.unwrap();
    let entry = queue.join(&h1, &record.patient_code, "Chidi Eze").await.unwrap();
    assert_eq!(entry.queue_number, 1);
    assert_eq!(entry.status, WaitStatus::Waiting);

    let refreshed = ledger.lookup_by_code(&record.patient_code).await.unwrap();
    assert_eq!(refreshed.full_name.as_deref(), Some("Chidi Eze"));

    let again = queue.join(&h1, &record.patient_code, "Chidi Eze").await;
    assert_matches!(again, Err(HospitalPatientError::AlreadyQueued { .. }));
}

#[tokio::test]
async fn test_join_requires_enrollment_at_that_hospital() {
    let store = store(&TestConfig::default());
    let h1 = hospital(&store, "H1").await;
    let h2 = hospital(&store, "H2").await;
    let ledger = EnrollmentLedger::new(store.clone(), 20);
    let queue = queue_for(&store, 10);

    let record = ledger.enroll(&h1, "+2348011112222").await.unwrap();

    assert_matches!(
        queue.join(&h2, &record.patient_code, "Chidi Eze").await,
        Err(HospitalPatientError::NotEnrolled { .. })
    );
    assert_matches!(
        queue.join(&Uuid::new_v4().to_string(), &record.patient_code, "Chidi Eze").await,
        Err(HospitalPatientError::HospitalNotFound(_))
    );
    assert_matches!(
        queue.join("bad", &record.patient_code, "Chidi Eze").await,
        Err(HospitalPatientError::InvalidReference(_))
    );
}

#[tokio::test]
async fn test_position_matches_queue_rank() {
    let store = store(&TestConfig::default());
    let h1 = hospital(&store, "H1").await;
    let ledger = EnrollmentLedger::new(store.clone(), 20);
    let queue = queue_for(&store, 10);

    let mut codes = Vec::new();
    for i in 0..5 {
        let record = ledger.enroll(&h1, &format!("+234800000000{}", i)).await.unwrap();
        queue.join(&h1, &record.patient_code, &format!("Patient {}", i)).await.unwrap();
        codes.push(record.patient_code);
    }

    for (k, code) in codes.iter().enumerate() {
        let position = queue.position(code, &h1).await.unwrap();
        assert_eq!(position.position, Some(k as u64 + 1));
        assert_eq!(position.queue_number, Some(k as u64 + 1));
    }

    let waiting = queue.list_waiting(&h1).await.unwrap();
    let numbers: Vec<u64> = waiting.iter().map(|e| e.queue_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);

    assert_eq!(queue.position("ZZZZZZZZZ", &h1).await.unwrap(), QueuePosition::default());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_joins_get_distinct_queue_numbers() {
    let config = TestConfig::default();
    let store = store(&config);
    let h1 = hospital(&store, "H1").await;
    let ledger = EnrollmentLedger::new(store.clone(), config.patient_code_max_attempts);
    let queue = queue_for(&store, config.order_assignment_max_retries);
    let joiners = 64;

    let mut codes = Vec::new();
    for i in 0..joiners {
        let record = ledger.enroll(&h1, &format!("+2348100000{:03}", i)).await.unwrap();
        codes.push(record.patient_code);
    }

    let handles = codes.into_iter().map(|code| {
        let queue = queue.clone();
        let hospital_id = h1.clone();
        tokio::spawn(async move { queue.join(&hospital_id, &code, "Walk-in").await })
    });

    let mut numbers: Vec<u64> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| assert_ok!(joined.unwrap()).queue_number)
        .collect();
    numbers.sort_unstable();

    assert_eq!(numbers, (1..=joiners).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_hospital_patient_routes() {
    let (state, _) = TestConfig::default().memory_state(unique_indexes());
    let h1 = hospital(&state.store, "H1").await;
    let app = create_hospital_patient_router(state);

    let post = |uri: &str, body: Value| {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(post("/join-hospital", json!({"hospital_id": h1, "phone": "+2348011112222"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let enrolled: Value = serde_json::from_slice(&bytes).unwrap();
    let code = enrolled["data"]["patient_code"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post("/join-hospital", json!({"hospital_id": h1, "phone": "+2348011112222"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(post(
            "/join-queue",
            json!({"hospital_id": h1, "patient_code": code, "full_name": "Ngozi"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let uri = format!("/queue/position?patient_code={}&hospital_id={}", code, h1);
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let position: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(position["data"], json!({"position": 1, "queue_number": 1}));

    let response = app
        .clone()
        .oneshot(Request::builder().uri(format!("/{}", code)).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let found: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(found["data"]["patient_code"], code.as_str());
    assert_eq!(found["data"]["hospital"]["name"], "H1");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/hospital/not-a-uuid/queue")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
