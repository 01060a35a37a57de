use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::UniqueIndex;
use triage_cell::ReportStatus;

pub const HOSPITAL_QUEUES: &str = "hospital_queues";

pub const MIN_PRIORITY: i64 = 1;
pub const MAX_PRIORITY: i64 = 10;

pub const DOCTOR_ORDER_KEY: UniqueIndex = UniqueIndex::new(
    "hospital_queues_doctor_order_key",
    HOSPITAL_QUEUES,
    &["doctor_id", "queue_order"],
);

/// A patient is queued at most once per doctor.
pub const DOCTOR_PATIENT_KEY: UniqueIndex = UniqueIndex::new(
    "hospital_queues_doctor_patient_key",
    HOSPITAL_QUEUES,
    &["doctor_id", "patient_user_id"],
);

pub fn unique_indexes() -> Vec<UniqueIndex> {
    vec![DOCTOR_ORDER_KEY, DOCTOR_PATIENT_KEY]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorQueueEntry {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_user_id: Uuid,
    pub diagnosis_report_id: Uuid,
    /// Arrival order within the doctor's queue. Sparse after removals.
    pub queue_order: u64,
    /// 1..=10, higher is seen first.
    pub priority_level: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub hospital_id: String,
    pub doctor_id: String,
    pub patient_user_id: String,
    pub diagnosis_report_id: String,
    pub priority_level: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmitRequest {
    pub hospital_id: String,
    pub doctor_id: String,
    pub diagnosis_report_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePriorityRequest {
    pub priority_level: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueuePositionReport {
    pub position: Option<u64>,
    pub total_in_queue: u64,
    pub estimated_wait_time: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClearedQueue {
    pub deleted_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorSummary {
    pub name: String,
    pub specialization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisSummary {
    pub suggested_diagnosis: Option<String>,
    pub severity_score: u32,
    pub status: ReportStatus,
}

/// Related records joined onto a queue entry. A `None` field means the
/// referenced record does not exist.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueueEntryDetails {
    pub patient: Option<PatientSummary>,
    pub doctor: Option<DoctorSummary>,
    pub diagnosis: Option<DiagnosisSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorQueueView {
    #[serde(flatten)]
    pub entry: DoctorQueueEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<QueueEntryDetails>,
}
