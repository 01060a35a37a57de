use std::sync::Arc;

use serde_json::json;
use tracing::info;

use shared_utils::validate_reference;

use crate::error::TriageError;
use crate::models::{CreateDiagnosisReportRequest, SubmitDiagnosisRequest, TriageOutcome};
use crate::services::classifier::{ClassificationRequest, TriageClassifier};
use crate::services::reports::DiagnosisReportService;

/// Classifies a symptom submission and stores the resulting report.
#[derive(Clone)]
pub struct TriageService {
    classifier: Arc<dyn TriageClassifier>,
    reports: DiagnosisReportService,
}

impl TriageService {
    pub fn new(classifier: Arc<dyn TriageClassifier>, reports: DiagnosisReportService) -> Self {
        Self { classifier, reports }
    }

    pub async fn submit(&self, request: SubmitDiagnosisRequest) -> Result<TriageOutcome, TriageError> {
        let patient = validate_reference("patient_user_id", &request.patient_user_id)?;
        if request.symptoms.is_empty() {
            return Err(TriageError::ValidationError("symptoms must not be empty".to_string()));
        }
        info!("Processing diagnosis for patient: {}, disease: {}", patient, request.disease);

        let classification = ClassificationRequest {
            disease: request.disease.clone(),
            symptoms: request.symptoms.clone(),
            additional_notes: request.additional_notes.clone(),
        };
        let assessment = self.classifier.classify(&classification).await?;
        let severity_rank = assessment.severity_rank;
        let severity_score = severity_rank.score();
        let model_version = self.classifier.model_version();

        let report = self
            .reports
            .create_report(CreateDiagnosisReportRequest {
                patient_user_id: patient.to_string(),
                symptoms: json!(request.symptoms),
                severity: severity_score,
                ai_generated_diagnosis: json!({
                    "disease": request.disease,
                    "suggested_diagnosis": assessment.suggested_diagnosis,
                    "severity_rank": severity_rank,
                    "management_tips": assessment.management_tips,
                    "reasoning": assessment.reasoning,
                    "model_version": model_version,
                }),
            })
            .await?;

        info!(
            "Diagnosis completed for patient: {}, severity: {:?} ({})",
            patient, severity_rank, severity_score
        );

        Ok(TriageOutcome {
            report,
            disease: request.disease,
            assessment,
            severity_rank,
            severity_score,
            model_version,
        })
    }
}
