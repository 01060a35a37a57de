use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;

use hospital_cell::HospitalDirectory;
use patient_cell::PatientService;
use shared_database::RecordStore;
use triage_cell::DiagnosisReportService;

use crate::models::{
    DiagnosisSummary, DoctorQueueEntry, DoctorQueueView, DoctorSummary, PatientSummary,
    QueueEntryDetails,
};

/// Best-effort join of patient, doctor and diagnosis data onto queue entries.
#[derive(Clone)]
pub struct QueueEnricher {
    patients: PatientService,
    hospitals: HospitalDirectory,
    reports: DiagnosisReportService,
}

impl QueueEnricher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            patients: PatientService::new(store.clone()),
            hospitals: HospitalDirectory::new(store.clone()),
            reports: DiagnosisReportService::new(store),
        }
    }

    /// `None` when any lookup fails.
    pub async fn enrich_optional(&self, entry: &DoctorQueueEntry) -> Option<QueueEntryDetails> {
        let (patient, doctor, report) = tokio::join!(
            self.patients.find_patient(entry.patient_user_id),
            self.hospitals.find_doctor(entry.doctor_id),
            self.reports.find_report(entry.diagnosis_report_id),
        );

        let (patient, doctor, report) = match (patient, doctor, report) {
            (Ok(patient), Ok(doctor), Ok(report)) => (patient, doctor, report),
            (patient, doctor, report) => {
                let reason = [
                    patient.err().map(|e| e.to_string()),
                    doctor.err().map(|e| e.to_string()),
                    report.err().map(|e| e.to_string()),
                ]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join("; ");
                warn!("Could not populate related data for queue entry {}: {}", entry.id, reason);
                return None;
            }
        };

        Some(QueueEntryDetails {
            patient: patient.map(|p| PatientSummary {
                name: p.name,
                email: p.email,
                phone: p.phone,
            }),
            doctor: doctor.map(|d| DoctorSummary {
                name: d.name,
                specialization: d.specialization,
            }),
            diagnosis: report.map(|r| DiagnosisSummary {
                suggested_diagnosis: r
                    .ai_generated_diagnosis
                    .get("suggested_diagnosis")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                severity_score: r.severity,
                status: r.status,
            }),
        })
    }

    pub async fn view(&self, entry: DoctorQueueEntry) -> DoctorQueueView {
        let details = self.enrich_optional(&entry).await;
        DoctorQueueView { entry, details }
    }

    /// Views in the same order as `entries`.
    pub async fn view_all(&self, entries: Vec<DoctorQueueEntry>) -> Vec<DoctorQueueView> {
        join_all(entries.into_iter().map(|entry| self.view(entry))).await
    }
}
