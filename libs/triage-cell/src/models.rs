use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::services::ClassifierOutput;
use crate::severity::SeverityRank;

pub const DIAGNOSIS_REPORTS: &str = "diagnosis_reports";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisReport {
    pub id: Uuid,
    pub patient_user_id: Uuid,
    pub symptoms: Value,
    /// Severity score in 0..=100.
    pub severity: u32,
    pub ai_generated_diagnosis: Value,
    pub doctor_feedback: Option<Value>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDiagnosisReportRequest {
    pub patient_user_id: String,
    pub symptoms: Value,
    pub severity: u32,
    pub ai_generated_diagnosis: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFeedbackRequest {
    pub doctor_feedback: Option<Value>,
    pub status: Option<ReportStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitDiagnosisRequest {
    pub patient_user_id: String,
    pub disease: String,
    pub symptoms: BTreeMap<String, String>,
    pub additional_notes: Option<String>,
}

/// Result of a triage submission: the stored report plus the assessment it
/// was built from.
#[derive(Debug, Clone, Serialize)]
pub struct TriageOutcome {
    pub report: DiagnosisReport,
    pub disease: String,
    pub assessment: ClassifierOutput,
    pub severity_rank: SeverityRank,
    pub severity_score: u32,
    pub model_version: String,
}
