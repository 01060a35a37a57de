use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{from_document, to_document, Filter, RecordStore, SortKey};
use shared_utils::validate_reference;

use crate::error::TriageError;
use crate::models::{
    CreateDiagnosisReportRequest, DiagnosisReport, ReportStatus, UpdateFeedbackRequest,
    DIAGNOSIS_REPORTS,
};

const MAX_SEVERITY: u32 = 100;

#[derive(Clone)]
pub struct DiagnosisReportService {
    store: Arc<dyn RecordStore>,
}

impl DiagnosisReportService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create_report(
        &self,
        request: CreateDiagnosisReportRequest,
    ) -> Result<DiagnosisReport, TriageError> {
        let patient_user_id = validate_reference("patient_user_id", &request.patient_user_id)?;
        if request.severity > MAX_SEVERITY {
            return Err(TriageError::ValidationError(format!(
                "severity must be between 0 and {}",
                MAX_SEVERITY
            )));
        }
        if !request.symptoms.is_object() {
            return Err(TriageError::ValidationError("symptoms must be an object".to_string()));
        }
        if !request.ai_generated_diagnosis.is_object() {
            return Err(TriageError::ValidationError(
                "ai_generated_diagnosis must be an object".to_string(),
            ));
        }

        let now = Utc::now();
        let report = DiagnosisReport {
            id: Uuid::new_v4(),
            patient_user_id,
            symptoms: request.symptoms,
            severity: request.severity,
            ai_generated_diagnosis: request.ai_generated_diagnosis,
            doctor_feedback: None,
            status: ReportStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.create(DIAGNOSIS_REPORTS, to_document(&report)?).await?;
        let report: DiagnosisReport = from_document(created)?;
        info!(
            "Diagnosis report {} stored for patient {} with severity {}",
            report.id, report.patient_user_id, report.severity
        );
        Ok(report)
    }

    pub async fn find_report(&self, report_id: Uuid) -> Result<Option<DiagnosisReport>, TriageError> {
        let found = self.store.find_by_id(DIAGNOSIS_REPORTS, &report_id.to_string()).await?;
        Ok(found.map(from_document).transpose()?)
    }

    pub async fn get_report(&self, report_id: &str) -> Result<DiagnosisReport, TriageError> {
        let id = validate_reference("diagnosis_report_id", report_id)?;
        debug!("Fetching diagnosis report: {}", id);

        self.find_report(id)
            .await?
            .ok_or_else(|| TriageError::ReportNotFound(report_id.to_string()))
    }

    pub async fn list_for_patient(
        &self,
        patient_user_id: &str,
    ) -> Result<Vec<DiagnosisReport>, TriageError> {
        let patient = validate_reference("patient_user_id", patient_user_id)?;

        let docs = self
            .store
            .find(
                DIAGNOSIS_REPORTS,
                &Filter::new().eq("patient_user_id", patient),
                &[SortKey::desc("created_at")],
            )
            .await?;

        Ok(docs.into_iter().map(from_document).collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn update_feedback(
        &self,
        report_id: &str,
        request: UpdateFeedbackRequest,
    ) -> Result<DiagnosisReport, TriageError> {
        let id = validate_reference("diagnosis_report_id", report_id)?;

        let patch = json!({
            "doctor_feedback": request.doctor_feedback.unwrap_or(Value::Null),
            "status": request.status.unwrap_or(ReportStatus::Reviewed),
            "updated_at": Utc::now(),
        });

        let updated = self
            .store
            .find_by_id_and_update(DIAGNOSIS_REPORTS, &id.to_string(), patch)
            .await?
            .ok_or_else(|| TriageError::ReportNotFound(report_id.to_string()))?;

        info!("Doctor feedback recorded on report {}", id);
        Ok(from_document(updated)?)
    }
}
