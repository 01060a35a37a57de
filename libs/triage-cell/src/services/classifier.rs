use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TriageError;
use crate::severity::SeverityRank;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationRequest {
    pub disease: String,
    pub symptoms: BTreeMap<String, String>,
    pub additional_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierOutput {
    pub suggested_diagnosis: String,
    pub severity_rank: SeverityRank,
    pub management_tips: Vec<String>,
    pub reasoning: String,
}

/// Symptom classifier producing a severity rank with explanation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TriageClassifier: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> Result<ClassifierOutput, TriageError>;

    fn model_version(&self) -> String;
}
