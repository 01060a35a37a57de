use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{from_document, to_document, Filter, RecordStore, SortKey};
use shared_utils::validate_reference;

use crate::error::HospitalError;
use crate::models::{
    CreateDoctorRequest, CreateHospitalRequest, Doctor, Hospital, UpdateDoctorRequest,
    UpdateHospitalRequest, DOCTORS, HOSPITALS,
};

/// Hospitals and the doctors attached to them.
#[derive(Clone)]
pub struct HospitalDirectory {
    store: Arc<dyn RecordStore>,
}

impl HospitalDirectory {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create_hospital(
        &self,
        request: CreateHospitalRequest,
    ) -> Result<Hospital, HospitalError> {
        let name = required("name", &request.name)?;
        let address = required("address", &request.address)?;

        let now = Utc::now();
        let hospital = Hospital {
            id: Uuid::new_v4(),
            name,
            address,
            reg_no: request.reg_no.filter(|r| !r.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };

        let created = self.store.create(HOSPITALS, to_document(&hospital)?).await?;
        let hospital: Hospital = from_document(created)?;
        info!("Hospital {} registered as {}", hospital.name, hospital.id);

        Ok(hospital)
    }

    pub async fn find_hospital(&self, hospital_id: Uuid) -> Result<Option<Hospital>, HospitalError> {
        let found = self.store.find_by_id(HOSPITALS, &hospital_id.to_string()).await?;
        Ok(found.map(from_document).transpose()?)
    }

    pub async fn get_hospital(&self, hospital_id: &str) -> Result<Hospital, HospitalError> {
        let id = validate_reference("hospital_id", hospital_id)?;
        debug!("Fetching hospital: {}", id);

        self.find_hospital(id)
            .await?
            .ok_or_else(|| HospitalError::HospitalNotFound(hospital_id.to_string()))
    }

    pub async fn list_hospitals(&self) -> Result<Vec<Hospital>, HospitalError> {
        let docs = self
            .store
            .find(HOSPITALS, &Filter::new(), &[SortKey::asc("name")])
            .await?;

        Ok(docs.into_iter().map(from_document).collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn update_hospital(
        &self,
        hospital_id: &str,
        request: UpdateHospitalRequest,
    ) -> Result<Hospital, HospitalError> {
        let id = validate_reference("hospital_id", hospital_id)?;

        let mut patch = Map::new();
        if let Some(name) = request.name {
            patch.insert("name".to_string(), json!(required("name", &name)?));
        }
        if let Some(address) = request.address {
            patch.insert("address".to_string(), json!(required("address", &address)?));
        }
        if let Some(reg_no) = request.reg_no {
            patch.insert("reg_no".to_string(), json!(reg_no));
        }
        patch.insert("updated_at".to_string(), json!(Utc::now()));

        let updated = self
            .store
            .find_by_id_and_update(HOSPITALS, &id.to_string(), Value::Object(patch))
            .await?
            .ok_or_else(|| HospitalError::HospitalNotFound(hospital_id.to_string()))?;

        info!("Hospital {} updated", id);
        Ok(from_document(updated)?)
    }

    /// Removes a hospital together with its doctors. Enrollment and wait
    /// queue records are kept as history.
    pub async fn delete_hospital(&self, hospital_id: &str) -> Result<(), HospitalError> {
        let id = validate_reference("hospital_id", hospital_id)?;

        let deleted = self.store.delete_one(HOSPITALS, &Filter::by_id(id)).await?;
        if deleted == 0 {
            return Err(HospitalError::HospitalNotFound(hospital_id.to_string()));
        }

        let doctors = self
            .store
            .delete_many(DOCTORS, &Filter::new().eq("hospital_id", id))
            .await?;
        if doctors > 0 {
            info!("Removed {} doctors with hospital {}", doctors, id);
        }

        info!("Hospital {} deleted", id);
        Ok(())
    }

    pub async fn create_doctor(
        &self,
        hospital_id: &str,
        request: CreateDoctorRequest,
    ) -> Result<Doctor, HospitalError> {
        let hospital = self.get_hospital(hospital_id).await?;
        let name = required("name", &request.name)?;
        let specialization = required("specialization", &request.specialization)?;

        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            hospital_id: hospital.id,
            name,
            specialization,
            email: request.email,
            phone: request.phone,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.create(DOCTORS, to_document(&doctor)?).await?;
        let doctor: Doctor = from_document(created)?;
        info!("Doctor {} added to hospital {}", doctor.id, hospital.id);

        Ok(doctor)
    }

    pub async fn find_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, HospitalError> {
        let found = self.store.find_by_id(DOCTORS, &doctor_id.to_string()).await?;
        Ok(found.map(from_document).transpose()?)
    }

    pub async fn get_doctor(
        &self,
        hospital_id: &str,
        doctor_id: &str,
    ) -> Result<Doctor, HospitalError> {
        let hospital = validate_reference("hospital_id", hospital_id)?;
        let doctor = validate_reference("doctor_id", doctor_id)?;

        let filter = Filter::by_id(doctor).eq("hospital_id", hospital);
        let found = self.store.find_one(DOCTORS, &filter).await?;

        match found {
            Some(doc) => Ok(from_document(doc)?),
            None => Err(HospitalError::DoctorNotFound {
                hospital_id: hospital_id.to_string(),
                doctor_id: doctor_id.to_string(),
            }),
        }
    }

    pub async fn update_doctor(
        &self,
        hospital_id: &str,
        doctor_id: &str,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, HospitalError> {
        let existing = self.get_doctor(hospital_id, doctor_id).await?;

        let mut patch = Map::new();
        if let Some(name) = request.name {
            patch.insert("name".to_string(), json!(required("name", &name)?));
        }
        if let Some(specialization) = request.specialization {
            patch.insert(
                "specialization".to_string(),
                json!(required("specialization", &specialization)?),
            );
        }
        if let Some(email) = request.email {
            patch.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = request.phone {
            patch.insert("phone".to_string(), json!(phone));
        }
        patch.insert("updated_at".to_string(), json!(Utc::now()));

        let updated = self
            .store
            .find_by_id_and_update(DOCTORS, &existing.id.to_string(), Value::Object(patch))
            .await?
            .ok_or_else(|| HospitalError::DoctorNotFound {
                hospital_id: hospital_id.to_string(),
                doctor_id: doctor_id.to_string(),
            })?;

        info!("Doctor {} updated", existing.id);
        Ok(from_document(updated)?)
    }

    pub async fn delete_doctor(&self, hospital_id: &str, doctor_id: &str) -> Result<(), HospitalError> {
        let hospital = validate_reference("hospital_id", hospital_id)?;
        let doctor = validate_reference("doctor_id", doctor_id)?;

        let filter = Filter::by_id(doctor).eq("hospital_id", hospital);
        if self.store.delete_one(DOCTORS, &filter).await? == 0 {
            return Err(HospitalError::DoctorNotFound {
                hospital_id: hospital_id.to_string(),
                doctor_id: doctor_id.to_string(),
            });
        }

        info!("Doctor {} removed from hospital {}", doctor, hospital);
        Ok(())
    }

    pub async fn list_doctors(&self, hospital_id: &str) -> Result<Vec<Doctor>, HospitalError> {
        let hospital = validate_reference("hospital_id", hospital_id)?;

        let docs = self
            .store
            .find(DOCTORS, &Filter::new().eq("hospital_id", hospital), &[SortKey::asc("name")])
            .await?;

        Ok(docs.into_iter().map(from_document).collect::<Result<Vec<_>, _>>()?)
    }
}

fn required(field: &str, value: &str) -> Result<String, HospitalError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HospitalError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}
