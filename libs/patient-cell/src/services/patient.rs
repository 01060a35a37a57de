use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{from_document, to_document, Filter, RecordStore, SortKey};
use shared_utils::validate_reference;

use crate::models::{
    CreatePatientRequest, Patient, PatientError, PatientSearchQuery, UpdatePatientRequest,
    PATIENTS, PATIENT_EMAIL_KEY,
};

const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn RecordStore>,
}

impl PatientService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        let email = normalize_email(&request.email)?;
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(PatientError::ValidationError("name must not be empty".to_string()));
        }
        debug!("Creating new patient profile for: {}", email);

        let existing = self
            .store
            .find_one(PATIENTS, &Filter::new().eq("email", &email))
            .await?;
        if existing.is_some() {
            return Err(PatientError::EmailAlreadyExists { email });
        }

        let now = Utc::now();
        let patient = Patient {
            id: Uuid::new_v4(),
            name,
            email: email.clone(),
            phone: request.phone,
            age: request.age,
            gender: request.gender,
            medical_history: request.medical_history,
            created_at: now,
            updated_at: now,
        };

        let created = match self.store.create(PATIENTS, to_document(&patient)?).await {
            Ok(created) => created,
            Err(e) if e.violates(PATIENT_EMAIL_KEY.name) => {
                return Err(PatientError::EmailAlreadyExists { email });
            }
            Err(e) => return Err(e.into()),
        };

        let patient: Patient = from_document(created)?;
        info!("Patient profile created with ID: {}", patient.id);
        Ok(patient)
    }

    pub async fn find_patient(&self, patient_id: Uuid) -> Result<Option<Patient>, PatientError> {
        let found = self.store.find_by_id(PATIENTS, &patient_id.to_string()).await?;
        Ok(found.map(from_document).transpose()?)
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<Patient, PatientError> {
        let id = validate_reference("patient_id", patient_id)?;
        debug!("Fetching patient profile: {}", id);

        self.find_patient(id)
            .await?
            .ok_or_else(|| PatientError::NotFound(patient_id.to_string()))
    }

    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        let id = validate_reference("patient_id", patient_id)?;
        debug!("Updating patient profile: {}", id);

        let mut update_data = Map::new();
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(PatientError::ValidationError("name must not be empty".to_string()));
            }
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(age) = request.age {
            update_data.insert("age".to_string(), json!(age));
        }
        if let Some(gender) = request.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(medical_history) = request.medical_history {
            update_data.insert("medical_history".to_string(), json!(medical_history));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now()));

        let updated = self
            .store
            .find_by_id_and_update(PATIENTS, &id.to_string(), Value::Object(update_data))
            .await?
            .ok_or_else(|| PatientError::NotFound(patient_id.to_string()))?;

        info!("Patient profile {} updated", id);
        Ok(from_document(updated)?)
    }

    pub async fn delete_patient(&self, patient_id: &str) -> Result<(), PatientError> {
        let id = validate_reference("patient_id", patient_id)?;

        if self.store.delete_one(PATIENTS, &Filter::by_id(id)).await? == 0 {
            return Err(PatientError::NotFound(patient_id.to_string()));
        }

        info!("Patient profile {} deleted", id);
        Ok(())
    }

    pub async fn search_patients(&self, query: PatientSearchQuery) -> Result<Vec<Patient>, PatientError> {
        debug!("Searching patients with query: {:?}", query);

        let mut filter = Filter::new();
        if let Some(email) = query.email.as_deref() {
            filter = filter.eq("email", normalize_email(email)?);
        }
        if let Some(phone) = query.phone.as_deref() {
            filter = filter.eq("phone", phone.trim());
        }

        let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let docs = self
            .store
            .find(PATIENTS, &filter, &[SortKey::asc("created_at")])
            .await?;

        docs.into_iter()
            .take(limit)
            .map(|doc| from_document(doc).map_err(PatientError::from))
            .collect()
    }
}

fn normalize_email(raw: &str) -> Result<String, PatientError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(PatientError::ValidationError(format!("invalid email: {}", raw)));
    }
    Ok(email)
}

