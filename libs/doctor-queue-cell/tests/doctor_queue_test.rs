use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tokio_test::assert_ok;
use tower::ServiceExt;
use uuid::Uuid;

use doctor_queue_cell::{
    create_doctor_queue_router, unique_indexes, AdmitRequest, DoctorQueue, DoctorQueueEntry,
    DoctorQueueError, EnqueueRequest,
};
use hospital_cell::{CreateDoctorRequest, CreateHospitalRequest, HospitalDirectory};
use patient_cell::{CreatePatientRequest, PatientService, PATIENTS};
use shared_database::{InMemoryStore, RecordStore};
use shared_utils::{test_utils::TestConfig, AppState};
use triage_cell::{CreateDiagnosisReportRequest, DiagnosisReportService, ReportStatus};

struct Fixture {
    state: Arc<AppState>,
    memory: Arc<InMemoryStore>,
    queue: DoctorQueue,
    hospital_id: String,
    doctor_id: String,
}

impl Fixture {
    async fn new() -> Self {
        let (state, memory) = TestConfig::default().memory_state(unique_indexes());
        let queue = DoctorQueue::new(state.store.clone(), &state.config);

        let directory = HospitalDirectory::new(state.store.clone());
        let hospital = directory
            .create_hospital(CreateHospitalRequest {
                name: "Lagos General".to_string(),
                address: "Marina, Lagos".to_string(),
                reg_no: None,
            })
            .await
            .unwrap();
        let doctor = directory
            .create_doctor(
                &hospital.id.to_string(),
                CreateDoctorRequest {
                    name: "Dr. Adaeze Okafor".to_string(),
                    specialization: "General Practice".to_string(),
                    email: None,
                    phone: None,
                },
            )
            .await
            .unwrap();

        Self {
            state,
            memory,
            queue,
            hospital_id: hospital.id.to_string(),
            doctor_id: doctor.id.to_string(),
        }
    }

    fn store(&self) -> Arc<dyn RecordStore> {
        self.state.store.clone()
    }

    async fn patient(&self, name: &str) -> String {
        PatientService::new(self.store())
            .create_patient(CreatePatientRequest {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                phone: Some("+2348000000000".to_string()),
                age: Some(30),
                gender: None,
                medical_history: Vec::new(),
            })
            .await
            .unwrap()
            .id
            .to_string()
    }

    async fn report(&self, patient_user_id: &str, severity: u32) -> String {
        DiagnosisReportService::new(self.store())
            .create_report(CreateDiagnosisReportRequest {
                patient_user_id: patient_user_id.to_string(),
                symptoms: json!({"fever": "yes"}),
                severity,
                ai_generated_diagnosis: json!({"suggested_diagnosis": "Malaria"}),
            })
            .await
            .unwrap()
            .id
            .to_string()
    }

    fn request(&self, patient_user_id: &str, priority_level: i64) -> EnqueueRequest {
        EnqueueRequest {
            hospital_id: self.hospital_id.clone(),
            doctor_id: self.doctor_id.clone(),
            patient_user_id: patient_user_id.to_string(),
            diagnosis_report_id: Uuid::new_v4().to_string(),
            priority_level,
        }
    }

    async fn enqueue(&self, priority_level: i64) -> DoctorQueueEntry {
        let patient = Uuid::new_v4().to_string();
        self.queue.enqueue(self.request(&patient, priority_level)).await.unwrap()
    }
}

fn patient_ids(views: &[doctor_queue_cell::DoctorQueueView]) -> Vec<Uuid> {
    views.iter().map(|view| view.entry.patient_user_id).collect()
}

#[tokio::test]
async fn test_higher_priority_is_served_first_then_arrival() {
    let fx = Fixture::new().await;
    let p1 = fx.enqueue(3).await;
    let p2 = fx.enqueue(8).await;
    let p3 = fx.enqueue(3).await;

    assert_eq!((p1.queue_order, p2.queue_order, p3.queue_order), (1, 2, 3));

    let views = assert_ok!(fx.queue.list_for_doctor(&fx.doctor_id).await);
    assert_eq!(
        patient_ids(&views),
        vec![p2.patient_user_id, p1.patient_user_id, p3.patient_user_id]
    );
}

#[tokio::test]
async fn test_late_urgent_patient_jumps_ahead() {
    let fx = Fixture::new().await;
    let routine = fx.enqueue(5).await;
    let urgent = fx.enqueue(10).await;

    let views = fx.queue.list_for_doctor(&fx.doctor_id).await.unwrap();
    assert_eq!(patient_ids(&views), vec![urgent.patient_user_id, routine.patient_user_id]);

    let position = fx
        .queue
        .position(&routine.patient_user_id.to_string(), &fx.doctor_id)
        .await
        .unwrap();
    assert_eq!(position.position, Some(2));
    assert_eq!(position.total_in_queue, 2);
    assert_eq!(position.estimated_wait_time.as_deref(), Some("30 minutes"));
}

#[tokio::test]
async fn test_position_for_absent_patient() {
    let fx = Fixture::new().await;
    fx.enqueue(4).await;

    let position = fx
        .queue
        .position(&Uuid::new_v4().to_string(), &fx.doctor_id)
        .await
        .unwrap();
    assert_eq!(position.position, None);
    assert_eq!(position.total_in_queue, 1);
    assert_eq!(position.estimated_wait_time, None);
}

#[tokio::test]
async fn test_wait_estimate_grows_with_position() {
    let fx = Fixture::new().await;
    let mut last = None;
    for _ in 0..6 {
        last = Some(fx.enqueue(5).await);
    }
    let last = last.unwrap();

    let position = fx
        .queue
        .position(&last.patient_user_id.to_string(), &fx.doctor_id)
        .await
        .unwrap();
    assert_eq!(position.position, Some(6));
    assert_eq!(position.estimated_wait_time.as_deref(), Some("1 hour 15 minutes"));
}

#[tokio::test]
async fn test_duplicate_patient_for_same_doctor_conflicts() {
    let fx = Fixture::new().await;
    let patient = Uuid::new_v4().to_string();
    assert_ok!(fx.queue.enqueue(fx.request(&patient, 5)).await);

    let again = fx.queue.enqueue(fx.request(&patient, 9)).await;
    assert_matches!(again, Err(DoctorQueueError::AlreadyQueued { .. }));

    let count = fx.queue.list_for_doctor(&fx.doctor_id).await.unwrap().len();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_any_write() {
    let fx = Fixture::new().await;
    let patient = Uuid::new_v4().to_string();

    for level in [0, 11, -1] {
        let result = fx.queue.enqueue(fx.request(&patient, level)).await;
        assert_matches!(result, Err(DoctorQueueError::InvalidPriority(l)) if l == level);
    }

    let mut bad = fx.request(&patient, 5);
    bad.doctor_id = "doctor-1".to_string();
    assert_matches!(fx.queue.enqueue(bad).await, Err(DoctorQueueError::InvalidReference(_)));

    assert!(fx.queue.list_for_doctor(&fx.doctor_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_removal_keeps_order_gaps() {
    let fx = Fixture::new().await;
    let first = fx.enqueue(5).await;
    let second = fx.enqueue(5).await;
    let third = fx.enqueue(5).await;

    assert_ok!(fx.queue.remove(&second.id.to_string()).await);
    assert_matches!(
        fx.queue.remove(&second.id.to_string()).await,
        Err(DoctorQueueError::EntryNotFound(_))
    );

    let orders: Vec<u64> = fx
        .queue
        .list_for_doctor(&fx.doctor_id)
        .await
        .unwrap()
        .iter()
        .map(|view| view.entry.queue_order)
        .collect();
    assert_eq!(orders, vec![first.queue_order, third.queue_order]);
    assert_eq!(orders, vec![1, 3]);

    let fourth = fx.enqueue(5).await;
    assert_eq!(fourth.queue_order, 4);
}

#[tokio::test]
async fn test_priority_update_reorders_without_touching_arrival() {
    let fx = Fixture::new().await;
    let first = fx.enqueue(5).await;
    let second = fx.enqueue(5).await;

    let updated = assert_ok!(fx.queue.update_priority(&second.id.to_string(), 9).await);
    assert_eq!(updated.priority_level, 9);
    assert_eq!(updated.queue_order, second.queue_order);

    let views = fx.queue.list_for_doctor(&fx.doctor_id).await.unwrap();
    assert_eq!(patient_ids(&views), vec![second.patient_user_id, first.patient_user_id]);

    assert_matches!(
        fx.queue.update_priority(&second.id.to_string(), 42).await,
        Err(DoctorQueueError::InvalidPriority(42))
    );
    assert_matches!(
        fx.queue.update_priority(&Uuid::new_v4().to_string(), 3).await,
        Err(DoctorQueueError::EntryNotFound(_))
    );
}

#[tokio::test]
async fn test_clear_is_idempotent_and_scoped_to_doctor() {
    let fx = Fixture::new().await;
    for level in [2, 4, 6] {
        fx.enqueue(level).await;
    }

    let other_doctor = Uuid::new_v4().to_string();
    let mut elsewhere = fx.request(&Uuid::new_v4().to_string(), 5);
    elsewhere.doctor_id = other_doctor.clone();
    let elsewhere = fx.queue.enqueue(elsewhere).await.unwrap();
    assert_eq!(elsewhere.queue_order, 1);

    assert_eq!(fx.queue.clear(&fx.doctor_id).await.unwrap().deleted_count, 3);
    assert_eq!(fx.queue.clear(&fx.doctor_id).await.unwrap().deleted_count, 0);
    assert_eq!(fx.queue.list_for_doctor(&other_doctor).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_admit_maps_report_severity_to_priority() {
    let fx = Fixture::new().await;
    let patient = fx.patient("Chidi").await;
    let report = fx.report(&patient, 73).await;

    let entry = assert_ok!(
        fx.queue
            .admit_from_report(AdmitRequest {
                hospital_id: fx.hospital_id.clone(),
                doctor_id: fx.doctor_id.clone(),
                diagnosis_report_id: report.clone(),
            })
            .await
    );
    assert_eq!(entry.priority_level, 8);
    assert_eq!(entry.patient_user_id.to_string(), patient);
    assert_eq!(entry.diagnosis_report_id.to_string(), report);

    let missing = fx
        .queue
        .admit_from_report(AdmitRequest {
            hospital_id: fx.hospital_id.clone(),
            doctor_id: fx.doctor_id.clone(),
            diagnosis_report_id: Uuid::new_v4().to_string(),
        })
        .await;
    assert_matches!(missing, Err(DoctorQueueError::Report(_)));
}

#[tokio::test]
async fn test_views_carry_related_records() {
    let fx = Fixture::new().await;
    let patient = fx.patient("Amaka").await;
    let report = fx.report(&patient, 40).await;
    let entry = fx
        .queue
        .admit_from_report(AdmitRequest {
            hospital_id: fx.hospital_id.clone(),
            doctor_id: fx.doctor_id.clone(),
            diagnosis_report_id: report,
        })
        .await
        .unwrap();

    let view = assert_ok!(fx.queue.get_by_id(&entry.id.to_string()).await);
    let details = view.details.expect("details should be populated");
    assert_eq!(details.patient.unwrap().name, "Amaka");
    assert_eq!(details.doctor.unwrap().specialization, "General Practice");
    let diagnosis = details.diagnosis.unwrap();
    assert_eq!(diagnosis.suggested_diagnosis.as_deref(), Some("Malaria"));
    assert_eq!(diagnosis.severity_score, 40);
    assert_eq!(diagnosis.status, ReportStatus::Pending);
}

#[tokio::test]
async fn test_enrichment_failure_still_returns_queue() {
    let fx = Fixture::new().await;
    let patient = fx.patient("Tunde").await;
    let mut request = fx.request(&patient, 6);
    request.diagnosis_report_id = fx.report(&patient, 55).await;
    fx.queue.enqueue(request).await.unwrap();
    fx.enqueue(2).await;

    fx.memory.simulate_outage(PATIENTS);

    let views = assert_ok!(fx.queue.list_for_hospital(&fx.hospital_id).await);
    assert_eq!(views.len(), 2);
    assert!(views.iter().all(|view| view.details.is_none()));
    assert_eq!(views[0].entry.priority_level, 6);

    fx.memory.restore(PATIENTS);
    let views = fx.queue.list_for_hospital(&fx.hospital_id).await.unwrap();
    assert!(views.iter().all(|view| view.details.is_some()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_enqueues_get_distinct_orders() {
    let fx = Fixture::new().await;
    let writers = 64;

    let handles = (0..writers).map(|i| {
        let queue = fx.queue.clone();
        let request = fx.request(&Uuid::new_v4().to_string(), 1 + (i % 10));
        tokio::spawn(async move { queue.enqueue(request).await })
    });

    let mut orders: Vec<u64> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| assert_ok!(joined.unwrap()).queue_order)
        .collect();
    orders.sort_unstable();
    assert_eq!(orders, (1..=writers as u64).collect::<Vec<_>>());

    let served = fx.queue.list_for_doctor(&fx.doctor_id).await.unwrap();
    let priorities: Vec<u8> = served.iter().map(|view| view.entry.priority_level).collect();
    assert!(priorities.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn test_doctor_queue_routes() {
    let fx = Fixture::new().await;
    let app = create_doctor_queue_router(fx.state.clone());
    let patient = Uuid::new_v4().to_string();

    let send = |method: &str, uri: String, body: Option<Value>| {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    };

    let body = json!({
        "hospital_id": fx.hospital_id,
        "doctor_id": fx.doctor_id,
        "patient_user_id": patient,
        "diagnosis_report_id": Uuid::new_v4(),
        "priority_level": 7
    });
    let response = app.clone().oneshot(send("POST", "/".into(), Some(body.clone()))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let created: Value = serde_json::from_slice(&bytes).unwrap();
    let queue_id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["queue_order"], 1);

    let response = app.clone().oneshot(send("POST", "/".into(), Some(body))).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(send("PATCH", format!("/{}/priority", queue_id), Some(json!({"priority_level": 0}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(send("GET", format!("/position/{}/{}", patient, fx.doctor_id), None))
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let position: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        position["data"],
        json!({"position": 1, "total_in_queue": 1, "estimated_wait_time": "15 minutes"})
    );

    let response = app
        .clone()
        .oneshot(send("DELETE", format!("/doctor/{}/clear", fx.doctor_id), None))
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let cleared: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(cleared["data"]["deleted_count"], 1);

    let response = app
        .oneshot(send("GET", format!("/{}", queue_id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
