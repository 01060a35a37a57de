use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::UniqueIndex;

pub const QUESTIONS: &str = "questions";

/// One question per step of a disease's questionnaire.
pub const QUESTION_STEP_KEY: UniqueIndex =
    UniqueIndex::new("questions_disease_step_key", QUESTIONS, &["disease", "step_number"]);

pub fn unique_indexes() -> Vec<UniqueIndex> {
    vec![QUESTION_STEP_KEY]
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    YesNo,
    Text,
    MultipleChoice,
}

/// A screening question shown at one step of a disease questionnaire.
/// `field_name` is the key the answer is stored under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: Uuid,
    pub disease: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    pub step_number: u32,
    pub field_name: String,
    pub is_active: bool,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestionRequest {
    pub disease: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    pub step_number: u32,
    pub field_name: String,
    pub is_active: Option<bool>,
    pub is_required: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateQuestionRequest {
    pub disease: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub options: Option<Vec<String>>,
    pub step_number: Option<u32>,
    pub field_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_required: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionQuery {
    pub disease: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedOutcome {
    pub message: String,
    pub count: u64,
}
