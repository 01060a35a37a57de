use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{from_document, to_document, Filter, RecordStore, SortKey, StoreError};
use shared_utils::validate_reference;

use crate::error::QuestionError;
use crate::models::{
    CreateQuestionRequest, Question, QuestionType, SeedOutcome, UpdateQuestionRequest,
    QUESTIONS, QUESTION_STEP_KEY,
};
use crate::services::malaria::{self, MALARIA};

/// Disease questionnaires, one question per step.
#[derive(Clone)]
pub struct QuestionBank {
    store: Arc<dyn RecordStore>,
}

impl QuestionBank {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create_question(
        &self,
        request: CreateQuestionRequest,
    ) -> Result<Question, QuestionError> {
        let disease = required("disease", &request.disease)?;
        let title = required("title", &request.title)?;
        let field_name = required("field_name", &request.field_name)?;
        check_step(request.step_number)?;
        check_options(request.question_type, &request.options)?;

        let now = Utc::now();
        let question = Question {
            id: Uuid::new_v4(),
            disease,
            title,
            description: request.description.filter(|d| !d.trim().is_empty()),
            question_type: request.question_type,
            options: request.options,
            step_number: request.step_number,
            field_name,
            is_active: request.is_active.unwrap_or(true),
            is_required: request.is_required.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };

        let created = self
            .store
            .create(QUESTIONS, to_document(&question)?)
            .await
            .map_err(|e| step_conflict(e, &question.disease, question.step_number))?;

        let question: Question = from_document(created)?;
        debug!(
            "Question {} added to {} at step {}",
            question.id, question.disease, question.step_number
        );
        Ok(question)
    }

    /// Active questions for `disease`, in step order.
    pub async fn find_by_disease(&self, disease: &str) -> Result<Vec<Question>, QuestionError> {
        let filter = Filter::new().eq("disease", disease.trim()).eq("is_active", true);
        let docs = self
            .store
            .find(QUESTIONS, &filter, &[SortKey::asc("step_number")])
            .await?;

        Ok(docs.into_iter().map(from_document).collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn find_by_disease_and_step(
        &self,
        disease: &str,
        step: u32,
    ) -> Result<Option<Question>, QuestionError> {
        let filter = Filter::new()
            .eq("disease", disease.trim())
            .eq("step_number", step)
            .eq("is_active", true);
        let found = self.store.find_one(QUESTIONS, &filter).await?;
        Ok(found.map(from_document).transpose()?)
    }

    pub async fn get_step(&self, disease: &str, step: &str) -> Result<Question, QuestionError> {
        let number: u32 = step.trim().parse().map_err(|_| {
            QuestionError::ValidationError(format!("step must be a positive integer, got {}", step))
        })?;

        self.find_by_disease_and_step(disease, number)
            .await?
            .ok_or_else(|| QuestionError::StepNotFound {
                disease: disease.to_string(),
                step: step.to_string(),
            })
    }

    /// Every question, active or not, grouped by disease in step order.
    pub async fn list_questions(&self) -> Result<Vec<Question>, QuestionError> {
        let docs = self
            .store
            .find(
                QUESTIONS,
                &Filter::new(),
                &[SortKey::asc("disease"), SortKey::asc("step_number")],
            )
            .await?;

        Ok(docs.into_iter().map(from_document).collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn get_question(&self, question_id: &str) -> Result<Question, QuestionError> {
        let id = validate_reference("question_id", question_id)?;

        let found = self.store.find_by_id(QUESTIONS, &id.to_string()).await?;
        match found {
            Some(doc) => Ok(from_document(doc)?),
            None => Err(QuestionError::QuestionNotFound(question_id.to_string())),
        }
    }

    pub async fn update_question(
        &self,
        question_id: &str,
        request: UpdateQuestionRequest,
    ) -> Result<Question, QuestionError> {
        let current = self.get_question(question_id).await?;

        let mut patch = Map::new();
        let disease = match request.disease {
            Some(disease) => required("disease", &disease)?,
            None => current.disease.clone(),
        };
        patch.insert("disease".to_string(), json!(disease));

        let step_number = request.step_number.unwrap_or(current.step_number);
        check_step(step_number)?;
        patch.insert("step_number".to_string(), json!(step_number));

        let question_type = request.question_type.unwrap_or(current.question_type);
        let options = request.options.unwrap_or_else(|| current.options.clone());
        check_options(question_type, &options)?;
        patch.insert("type".to_string(), json!(question_type));
        patch.insert("options".to_string(), json!(options));

        if let Some(title) = request.title {
            patch.insert("title".to_string(), json!(required("title", &title)?));
        }
        if let Some(field_name) = request.field_name {
            patch.insert("field_name".to_string(), json!(required("field_name", &field_name)?));
        }
        if let Some(description) = request.description {
            patch.insert("description".to_string(), json!(description));
        }
        if let Some(is_active) = request.is_active {
            patch.insert("is_active".to_string(), json!(is_active));
        }
        if let Some(is_required) = request.is_required {
            patch.insert("is_required".to_string(), json!(is_required));
        }
        patch.insert("updated_at".to_string(), json!(Utc::now()));

        let updated = self
            .store
            .find_by_id_and_update(QUESTIONS, &current.id.to_string(), Value::Object(patch))
            .await
            .map_err(|e| step_conflict(e, &disease, step_number))?
            .ok_or_else(|| QuestionError::QuestionNotFound(question_id.to_string()))?;

        info!("Question {} updated", current.id);
        Ok(from_document(updated)?)
    }

    pub async fn delete_question(&self, question_id: &str) -> Result<(), QuestionError> {
        let id = validate_reference("question_id", question_id)?;

        if self.store.delete_one(QUESTIONS, &Filter::by_id(id)).await? == 0 {
            return Err(QuestionError::QuestionNotFound(question_id.to_string()));
        }

        info!("Question {} deleted", id);
        Ok(())
    }

    /// Loads the default malaria questionnaire unless any malaria question
    /// is already present.
    pub async fn seed_malaria(&self) -> Result<SeedOutcome, QuestionError> {
        let existing = self.count_for(MALARIA).await?;
        if existing > 0 {
            return Ok(already_seeded(existing));
        }

        let mut count = 0;
        for request in malaria::questionnaire() {
            match self.create_question(request).await {
                Ok(_) => count += 1,
                // Another seeder got there first.
                Err(QuestionError::StepTaken { step_number, .. }) => {
                    warn!("Malaria step {} was seeded concurrently", step_number);
                    return Ok(already_seeded(self.count_for(MALARIA).await?));
                }
                Err(e) => return Err(e),
            }
        }

        info!("Seeded {} malaria questions", count);
        Ok(SeedOutcome {
            message: "Malaria questions seeded successfully".to_string(),
            count,
        })
    }

    async fn count_for(&self, disease: &str) -> Result<u64, StoreError> {
        self.store
            .count_documents(QUESTIONS, &Filter::new().eq("disease", disease))
            .await
    }
}

fn already_seeded(count: u64) -> SeedOutcome {
    SeedOutcome {
        message: "Malaria questions already exist".to_string(),
        count,
    }
}

fn step_conflict(e: StoreError, disease: &str, step_number: u32) -> QuestionError {
    if e.violates(QUESTION_STEP_KEY.name) {
        QuestionError::StepTaken {
            disease: disease.to_string(),
            step_number,
        }
    } else {
        e.into()
    }
}

fn required(field: &str, value: &str) -> Result<String, QuestionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(QuestionError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn check_step(step_number: u32) -> Result<(), QuestionError> {
    if step_number == 0 {
        return Err(QuestionError::ValidationError(
            "step_number must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn check_options(question_type: QuestionType, options: &[String]) -> Result<(), QuestionError> {
    if question_type == QuestionType::MultipleChoice && options.is_empty() {
        return Err(QuestionError::ValidationError(
            "multiple_choice questions need at least one option".to_string(),
        ));
    }
    Ok(())
}
