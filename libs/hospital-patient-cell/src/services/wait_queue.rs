use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use hospital_cell::HospitalDirectory;
use shared_database::{
    from_document, insert_with_next_order, to_document, Filter, RecordStore, SequenceError,
    SequenceScope, SortKey,
};
use shared_utils::validate_reference;

use crate::error::HospitalPatientError;
use crate::models::{
    QueuePosition, WaitQueueEntry, WaitStatus, PATIENT_QUEUES, QUEUE_NUMBER_KEY, WAITING_ENTRY_KEY,
};
use crate::services::enrollment::EnrollmentLedger;

/// Per-hospital queue of enrolled patients awaiting intake.
#[derive(Clone)]
pub struct WaitQueue {
    store: Arc<dyn RecordStore>,
    hospitals: HospitalDirectory,
    ledger: EnrollmentLedger,
    max_order_attempts: u32,
}

impl WaitQueue {
    pub fn new(store: Arc<dyn RecordStore>, ledger: EnrollmentLedger, max_order_attempts: u32) -> Self {
        Self {
            hospitals: HospitalDirectory::new(store.clone()),
            store,
            ledger,
            max_order_attempts,
        }
    }

    fn waiting_filter(hospital: Uuid) -> Filter {
        Filter::new()
            .eq("hospital_id", hospital)
            .eq("status", WaitStatus::Waiting.as_str())
    }

    pub async fn join(
        &self,
        hospital_id: &str,
        patient_code: &str,
        full_name: &str,
    ) -> Result<WaitQueueEntry, HospitalPatientError> {
        let hospital = validate_reference("hospital_id", hospital_id)?;
        let patient_code = patient_code.trim().to_uppercase();
        let full_name = full_name.trim();
        if patient_code.is_empty() {
            return Err(HospitalPatientError::ValidationError(
                "patient_code must not be empty".to_string(),
            ));
        }
        if full_name.is_empty() {
            return Err(HospitalPatientError::ValidationError(
                "full_name must not be empty".to_string(),
            ));
        }

        if self.hospitals.find_hospital(hospital).await?.is_none() {
            return Err(HospitalPatientError::HospitalNotFound(hospital_id.to_string()));
        }

        let enrollment = self
            .ledger
            .find_enrollment(hospital, &patient_code)
            .await?
            .ok_or_else(|| HospitalPatientError::NotEnrolled {
                patient_code: patient_code.clone(),
                hospital_id: hospital_id.to_string(),
            })?;

        self.ledger.backfill_full_name(&enrollment, full_name).await?;

        let already_waiting = self
            .store
            .find_one(
                PATIENT_QUEUES,
                &Self::waiting_filter(hospital).eq("patient_code", &patient_code),
            )
            .await?;
        if already_waiting.is_some() {
            return Err(HospitalPatientError::AlreadyQueued { patient_code });
        }

        let scope = SequenceScope {
            collection: PATIENT_QUEUES,
            scope: Filter::new().eq("hospital_id", hospital),
            order_field: "queue_number",
            order_index: QUEUE_NUMBER_KEY.name,
        };

        // queue_number is assigned by the store.
        let document = to_document(&WaitQueueEntry {
            id: Uuid::new_v4(),
            hospital_id: hospital,
            patient_code: patient_code.clone(),
            full_name: full_name.to_string(),
            queue_number: 0,
            status: WaitStatus::Waiting,
            joined_at: Utc::now(),
        })?;

        let created = insert_with_next_order(
            self.store.as_ref(),
            &scope,
            self.max_order_attempts,
            document,
        )
        .await
        .map_err(|e| match e {
            SequenceError::Duplicate { ref index } if index == WAITING_ENTRY_KEY.name => {
                HospitalPatientError::AlreadyQueued {
                    patient_code: patient_code.clone(),
                }
            }
            other => other.into(),
        })?;

        let entry: WaitQueueEntry = from_document(created)?;
        info!(
            "Patient {} joined queue at hospital {} as number {}",
            entry.patient_code, entry.hospital_id, entry.queue_number
        );
        Ok(entry)
    }

    pub async fn list_waiting(
        &self,
        hospital_id: &str,
    ) -> Result<Vec<WaitQueueEntry>, HospitalPatientError> {
        let hospital = validate_reference("hospital_id", hospital_id)?;

        let docs = self
            .store
            .find(
                PATIENT_QUEUES,
                &Self::waiting_filter(hospital),
                &[SortKey::asc("queue_number")],
            )
            .await?;

        Ok(docs.into_iter().map(from_document).collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn position(
        &self,
        patient_code: &str,
        hospital_id: &str,
    ) -> Result<QueuePosition, HospitalPatientError> {
        let hospital = validate_reference("hospital_id", hospital_id)?;
        let patient_code = patient_code.trim().to_uppercase();

        let Some(doc) = self
            .store
            .find_one(
                PATIENT_QUEUES,
                &Self::waiting_filter(hospital).eq("patient_code", &patient_code),
            )
            .await?
        else {
            debug!("Patient {} is not waiting at hospital {}", patient_code, hospital);
            return Ok(QueuePosition::default());
        };
        let entry: WaitQueueEntry = from_document(doc)?;

        let ahead = self
            .store
            .count_documents(
                PATIENT_QUEUES,
                &Self::waiting_filter(hospital).lt("queue_number", entry.queue_number),
            )
            .await?;

        Ok(QueuePosition {
            position: Some(ahead + 1),
            queue_number: Some(entry.queue_number),
        })
    }
}
