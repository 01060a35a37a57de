use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::UniqueIndex;

pub const HOSPITAL_PATIENTS: &str = "hospital_patients";
pub const PATIENT_QUEUES: &str = "patient_queues";

pub const PATIENT_CODE_KEY: UniqueIndex =
    UniqueIndex::new("hospital_patients_patient_code_key", HOSPITAL_PATIENTS, &["patient_code"]);

pub const HOSPITAL_PHONE_KEY: UniqueIndex = UniqueIndex::new(
    "hospital_patients_hospital_phone_key",
    HOSPITAL_PATIENTS,
    &["hospital_id", "phone"],
);

pub const QUEUE_NUMBER_KEY: UniqueIndex = UniqueIndex::new(
    "patient_queues_hospital_number_key",
    PATIENT_QUEUES,
    &["hospital_id", "queue_number"],
);

/// At most one waiting entry per patient at a hospital.
pub const WAITING_ENTRY_KEY: UniqueIndex = UniqueIndex::new(
    "patient_queues_waiting_key",
    PATIENT_QUEUES,
    &["hospital_id", "patient_code"],
)
.when_eq("status", "waiting");

pub fn unique_indexes() -> Vec<UniqueIndex> {
    vec![PATIENT_CODE_KEY, HOSPITAL_PHONE_KEY, QUEUE_NUMBER_KEY, WAITING_ENTRY_KEY]
}

/// A patient's enrollment at one hospital.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalPatientRecord {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub phone: String,
    pub patient_code: String,
    pub full_name: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HospitalSummary {
    pub name: String,
    pub address: String,
}

/// An enrollment together with where it was made. `hospital` is left out
/// when the hospital could not be loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrolledPatientView {
    #[serde(flatten)]
    pub record: HospitalPatientRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<HospitalSummary>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WaitStatus {
    Waiting,
    Called,
    Completed,
}

impl WaitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitStatus::Waiting => "waiting",
            WaitStatus::Called => "called",
            WaitStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitQueueEntry {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub patient_code: String,
    pub full_name: String,
    pub queue_number: u64,
    pub status: WaitStatus,
    pub joined_at: DateTime<Utc>,
}

/// Both fields are `None` when the patient is not waiting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QueuePosition {
    pub position: Option<u64>,
    pub queue_number: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinHospitalRequest {
    pub hospital_id: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinQueueRequest {
    pub hospital_id: String,
    pub patient_code: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuePositionQuery {
    pub patient_code: String,
    pub hospital_id: String,
}
