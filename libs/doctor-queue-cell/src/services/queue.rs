use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{
    from_document, insert_with_next_order, to_document, Filter, RecordStore, SequenceError,
    SequenceScope, SortKey,
};
use shared_utils::validate_reference;
use triage_cell::{priority_level_for_score, DiagnosisReportService};

use crate::error::DoctorQueueError;
use crate::models::{
    AdmitRequest, ClearedQueue, DoctorQueueEntry, DoctorQueueView, EnqueueRequest,
    QueuePositionReport, DOCTOR_ORDER_KEY, DOCTOR_PATIENT_KEY, HOSPITAL_QUEUES, MAX_PRIORITY,
    MIN_PRIORITY,
};
use crate::services::enrichment::QueueEnricher;
use crate::services::wait_time::format_estimated_wait;

/// Serving order: highest priority first, then arrival.
fn serving_order() -> [SortKey; 2] {
    [SortKey::desc("priority_level"), SortKey::asc("queue_order")]
}

fn validate_priority(level: i64) -> Result<u8, DoctorQueueError> {
    if (MIN_PRIORITY..=MAX_PRIORITY).contains(&level) {
        Ok(level as u8)
    } else {
        Err(DoctorQueueError::InvalidPriority(level))
    }
}

/// Per-doctor priority queues of triaged patients.
#[derive(Clone)]
pub struct DoctorQueue {
    store: Arc<dyn RecordStore>,
    reports: DiagnosisReportService,
    enricher: QueueEnricher,
    max_order_attempts: u32,
    average_consultation_minutes: u32,
}

impl DoctorQueue {
    pub fn new(store: Arc<dyn RecordStore>, config: &AppConfig) -> Self {
        Self {
            reports: DiagnosisReportService::new(store.clone()),
            enricher: QueueEnricher::new(store.clone()),
            store,
            max_order_attempts: config.order_assignment_max_retries,
            average_consultation_minutes: config.average_consultation_minutes,
        }
    }

    pub async fn enqueue(&self, request: EnqueueRequest) -> Result<DoctorQueueEntry, DoctorQueueError> {
        let hospital = validate_reference("hospital_id", &request.hospital_id)?;
        let doctor = validate_reference("doctor_id", &request.doctor_id)?;
        let patient = validate_reference("patient_user_id", &request.patient_user_id)?;
        let report = validate_reference("diagnosis_report_id", &request.diagnosis_report_id)?;
        let priority_level = validate_priority(request.priority_level)?;

        let already_queued = || DoctorQueueError::AlreadyQueued {
            patient_user_id: patient.to_string(),
            doctor_id: doctor.to_string(),
        };

        let existing = self
            .store
            .find_one(
                HOSPITAL_QUEUES,
                &Filter::new().eq("doctor_id", doctor).eq("patient_user_id", patient),
            )
            .await?;
        if existing.is_some() {
            return Err(already_queued());
        }

        let scope = SequenceScope {
            collection: HOSPITAL_QUEUES,
            scope: Filter::new().eq("doctor_id", doctor),
            order_field: "queue_order",
            order_index: DOCTOR_ORDER_KEY.name,
        };

        // queue_order is assigned by the store.
        let now = Utc::now();
        let document = to_document(&DoctorQueueEntry {
            id: Uuid::new_v4(),
            hospital_id: hospital,
            doctor_id: doctor,
            patient_user_id: patient,
            diagnosis_report_id: report,
            queue_order: 0,
            priority_level,
            created_at: now,
            updated_at: now,
        })?;

        let created = insert_with_next_order(
            self.store.as_ref(),
            &scope,
            self.max_order_attempts,
            document,
        )
        .await
        .map_err(|e| match e {
            SequenceError::Duplicate { ref index } if index == DOCTOR_PATIENT_KEY.name => {
                already_queued()
            }
            other => other.into(),
        })?;

        let entry: DoctorQueueEntry = from_document(created)?;
        info!(
            "Patient {} added to doctor {} queue at order {} with priority {}",
            entry.patient_user_id, entry.doctor_id, entry.queue_order, entry.priority_level
        );
        Ok(entry)
    }

    /// Enqueues the report's patient with a priority derived from its severity.
    pub async fn admit_from_report(
        &self,
        request: AdmitRequest,
    ) -> Result<DoctorQueueEntry, DoctorQueueError> {
        validate_reference("hospital_id", &request.hospital_id)?;
        validate_reference("doctor_id", &request.doctor_id)?;
        let report = self.reports.get_report(&request.diagnosis_report_id).await?;
        let priority_level = priority_level_for_score(report.severity);
        debug!(
            "Admitting report {} (severity {}) at priority {}",
            report.id, report.severity, priority_level
        );

        self.enqueue(EnqueueRequest {
            hospital_id: request.hospital_id,
            doctor_id: request.doctor_id,
            patient_user_id: report.patient_user_id.to_string(),
            diagnosis_report_id: report.id.to_string(),
            priority_level: i64::from(priority_level),
        })
        .await
    }

    pub async fn fetch_core_for_doctor(
        &self,
        doctor: Uuid,
    ) -> Result<Vec<DoctorQueueEntry>, DoctorQueueError> {
        self.fetch_core(Filter::new().eq("doctor_id", doctor)).await
    }

    pub async fn fetch_core_for_hospital(
        &self,
        hospital: Uuid,
    ) -> Result<Vec<DoctorQueueEntry>, DoctorQueueError> {
        self.fetch_core(Filter::new().eq("hospital_id", hospital)).await
    }

    async fn fetch_core(&self, filter: Filter) -> Result<Vec<DoctorQueueEntry>, DoctorQueueError> {
        let docs = self.store.find(HOSPITAL_QUEUES, &filter, &serving_order()).await?;
        Ok(docs.into_iter().map(from_document).collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn fetch_core_entry(&self, entry_id: &str) -> Result<DoctorQueueEntry, DoctorQueueError> {
        let id = validate_reference("queue_id", entry_id)?;
        let found = self
            .store
            .find_by_id(HOSPITAL_QUEUES, &id.to_string())
            .await?
            .ok_or_else(|| DoctorQueueError::EntryNotFound(entry_id.to_string()))?;
        Ok(from_document(found)?)
    }

    pub async fn list_for_doctor(&self, doctor_id: &str) -> Result<Vec<DoctorQueueView>, DoctorQueueError> {
        let doctor = validate_reference("doctor_id", doctor_id)?;
        let entries = self.fetch_core_for_doctor(doctor).await?;
        Ok(self.enricher.view_all(entries).await)
    }

    pub async fn list_for_hospital(
        &self,
        hospital_id: &str,
    ) -> Result<Vec<DoctorQueueView>, DoctorQueueError> {
        let hospital = validate_reference("hospital_id", hospital_id)?;
        let entries = self.fetch_core_for_hospital(hospital).await?;
        Ok(self.enricher.view_all(entries).await)
    }

    pub async fn get_by_id(&self, entry_id: &str) -> Result<DoctorQueueView, DoctorQueueError> {
        let entry = self.fetch_core_entry(entry_id).await?;
        Ok(self.enricher.view(entry).await)
    }

    pub async fn position(
        &self,
        patient_user_id: &str,
        doctor_id: &str,
    ) -> Result<QueuePositionReport, DoctorQueueError> {
        let patient = validate_reference("patient_user_id", patient_user_id)?;
        let doctor = validate_reference("doctor_id", doctor_id)?;

        let queue = self.fetch_core_for_doctor(doctor).await?;
        let position = queue
            .iter()
            .position(|entry| entry.patient_user_id == patient)
            .map(|index| index as u64 + 1);

        Ok(QueuePositionReport {
            position,
            total_in_queue: queue.len() as u64,
            estimated_wait_time: position
                .map(|p| format_estimated_wait(p, self.average_consultation_minutes)),
        })
    }

    /// Changes priority in place; `queue_order` is kept.
    pub async fn update_priority(
        &self,
        entry_id: &str,
        priority_level: i64,
    ) -> Result<DoctorQueueEntry, DoctorQueueError> {
        let id = validate_reference("queue_id", entry_id)?;
        let priority_level = validate_priority(priority_level)?;

        let updated = self
            .store
            .find_by_id_and_update(
                HOSPITAL_QUEUES,
                &id.to_string(),
                json!({ "priority_level": priority_level, "updated_at": Utc::now() }),
            )
            .await?
            .ok_or_else(|| DoctorQueueError::EntryNotFound(entry_id.to_string()))?;

        info!("Queue {} priority updated to {}", id, priority_level);
        Ok(from_document(updated)?)
    }

    /// Deletes one entry. Remaining entries keep their `queue_order`.
    pub async fn remove(&self, entry_id: &str) -> Result<(), DoctorQueueError> {
        let id = validate_reference("queue_id", entry_id)?;

        let deleted = self.store.delete_one(HOSPITAL_QUEUES, &Filter::by_id(id)).await?;
        if deleted == 0 {
            return Err(DoctorQueueError::EntryNotFound(entry_id.to_string()));
        }

        info!("Queue entry {} removed", id);
        Ok(())
    }

    pub async fn clear(&self, doctor_id: &str) -> Result<ClearedQueue, DoctorQueueError> {
        let doctor = validate_reference("doctor_id", doctor_id)?;

        let deleted_count = self
            .store
            .delete_many(HOSPITAL_QUEUES, &Filter::new().eq("doctor_id", doctor))
            .await?;

        info!("Cleared {} entries from doctor {}'s queue", deleted_count, doctor);
        Ok(ClearedQueue { deleted_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_bounds_are_inclusive() {
        assert_eq!(validate_priority(1).unwrap(), 1);
        assert_eq!(validate_priority(10).unwrap(), 10);
        assert!(matches!(validate_priority(0), Err(DoctorQueueError::InvalidPriority(0))));
        assert!(matches!(validate_priority(11), Err(DoctorQueueError::InvalidPriority(11))));
        assert!(matches!(validate_priority(-3), Err(DoctorQueueError::InvalidPriority(-3))));
    }
}
