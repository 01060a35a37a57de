use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use hospital_cell::HospitalDirectory;
use shared_database::{from_document, to_document, Filter, RecordStore, SortKey, StoreError};
use shared_utils::validate_reference;

use crate::error::HospitalPatientError;
use crate::models::{
    EnrolledPatientView, HospitalPatientRecord, HospitalSummary, HOSPITAL_PATIENTS,
    HOSPITAL_PHONE_KEY, PATIENT_CODE_KEY,
};
use crate::services::identity::{is_valid_patient_code, CodeSource, RandomCodeSource};

/// Issues patient codes and records which hospitals a phone number has
/// enrolled at.
#[derive(Clone)]
pub struct EnrollmentLedger {
    store: Arc<dyn RecordStore>,
    hospitals: HospitalDirectory,
    codes: Arc<dyn CodeSource>,
    max_code_attempts: u32,
}

impl EnrollmentLedger {
    pub fn new(store: Arc<dyn RecordStore>, max_code_attempts: u32) -> Self {
        Self::with_code_source(store, max_code_attempts, Arc::new(RandomCodeSource))
    }

    pub fn with_code_source(
        store: Arc<dyn RecordStore>,
        max_code_attempts: u32,
        codes: Arc<dyn CodeSource>,
    ) -> Self {
        Self {
            hospitals: HospitalDirectory::new(store.clone()),
            store,
            codes,
            max_code_attempts: max_code_attempts.max(1),
        }
    }

    pub async fn enroll(
        &self,
        hospital_id: &str,
        phone: &str,
    ) -> Result<HospitalPatientRecord, HospitalPatientError> {
        let hospital = validate_reference("hospital_id", hospital_id)?;
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(HospitalPatientError::ValidationError(
                "phone must not be empty".to_string(),
            ));
        }

        if self.hospitals.find_hospital(hospital).await?.is_none() {
            return Err(HospitalPatientError::HospitalNotFound(hospital_id.to_string()));
        }

        let existing = self
            .store
            .find_one(
                HOSPITAL_PATIENTS,
                &Filter::new().eq("hospital_id", hospital).eq("phone", phone),
            )
            .await?;
        if existing.is_some() {
            return Err(already_enrolled(hospital, phone));
        }

        for attempt in 1..=self.max_code_attempts {
            let code = self.codes.next_code();
            let taken = self
                .store
                .find_one(HOSPITAL_PATIENTS, &Filter::new().eq("patient_code", &code))
                .await?
                .is_some();
            if taken {
                debug!("Patient code collision on attempt {}, regenerating", attempt);
                continue;
            }

            let record = HospitalPatientRecord {
                id: Uuid::new_v4(),
                hospital_id: hospital,
                phone: phone.to_string(),
                patient_code: code,
                full_name: None,
                registered_at: Utc::now(),
            };

            match self.store.create(HOSPITAL_PATIENTS, to_document(&record)?).await {
                Ok(created) => {
                    let record: HospitalPatientRecord = from_document(created)?;
                    info!(
                        "Patient {} enrolled at hospital {}",
                        record.patient_code, record.hospital_id
                    );
                    return Ok(record);
                }
                // Lost a race for the same code between check and insert.
                Err(e) if e.violates(PATIENT_CODE_KEY.name) => {
                    debug!("Patient code taken concurrently on attempt {}", attempt);
                }
                Err(e) if e.violates(HOSPITAL_PHONE_KEY.name) => {
                    return Err(already_enrolled(hospital, phone));
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            "Could not issue a patient code for hospital {} after {} attempts",
            hospital, self.max_code_attempts
        );
        Err(HospitalPatientError::CodeSpaceExhausted {
            attempts: self.max_code_attempts,
        })
    }

    pub async fn lookup_by_code(
        &self,
        patient_code: &str,
    ) -> Result<HospitalPatientRecord, HospitalPatientError> {
        let code = patient_code.trim().to_uppercase();
        if !is_valid_patient_code(&code) {
            return Err(HospitalPatientError::PatientCodeNotFound(patient_code.to_string()));
        }

        let found = self
            .store
            .find_one(HOSPITAL_PATIENTS, &Filter::new().eq("patient_code", &code))
            .await?
            .ok_or_else(|| HospitalPatientError::PatientCodeNotFound(patient_code.to_string()))?;

        Ok(from_document(found)?)
    }

    /// Looks up an enrollment and attaches the hospital's name and address.
    /// A missing or unreachable hospital leaves the summary empty.
    pub async fn lookup_with_hospital(
        &self,
        patient_code: &str,
    ) -> Result<EnrolledPatientView, HospitalPatientError> {
        let record = self.lookup_by_code(patient_code).await?;

        let hospital = match self.hospitals.find_hospital(record.hospital_id).await {
            Ok(found) => found.map(|h| HospitalSummary {
                name: h.name,
                address: h.address,
            }),
            Err(e) => {
                warn!(
                    "Could not load hospital {} for patient {}: {}",
                    record.hospital_id, record.patient_code, e
                );
                None
            }
        };

        Ok(EnrolledPatientView { record, hospital })
    }

    /// Enrollment of `patient_code` at `hospital`, if any.
    pub async fn find_enrollment(
        &self,
        hospital: Uuid,
        patient_code: &str,
    ) -> Result<Option<HospitalPatientRecord>, StoreError> {
        let found = self
            .store
            .find_one(
                HOSPITAL_PATIENTS,
                &Filter::new().eq("patient_code", patient_code).eq("hospital_id", hospital),
            )
            .await?;
        found.map(from_document).transpose()
    }

    /// Stores `full_name` on the enrollment when it is unset or different.
    pub async fn backfill_full_name(
        &self,
        record: &HospitalPatientRecord,
        full_name: &str,
    ) -> Result<(), StoreError> {
        if record.full_name.as_deref() == Some(full_name) {
            return Ok(());
        }
        self.store
            .find_by_id_and_update(
                HOSPITAL_PATIENTS,
                &record.id.to_string(),
                json!({ "full_name": full_name }),
            )
            .await?;
        debug!("Updated full name for patient {}", record.patient_code);
        Ok(())
    }

    pub async fn list_for_hospital(
        &self,
        hospital_id: &str,
    ) -> Result<Vec<HospitalPatientRecord>, HospitalPatientError> {
        let hospital = validate_reference("hospital_id", hospital_id)?;

        let docs = self
            .store
            .find(
                HOSPITAL_PATIENTS,
                &Filter::new().eq("hospital_id", hospital),
                &[SortKey::desc("registered_at")],
            )
            .await?;

        Ok(docs.into_iter().map(from_document).collect::<Result<Vec<_>, _>>()?)
    }
}

fn already_enrolled(hospital: Uuid, phone: &str) -> HospitalPatientError {
    HospitalPatientError::AlreadyEnrolled {
        hospital_id: hospital.to_string(),
        phone: phone.to_string(),
    }
}
