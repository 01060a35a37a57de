pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod severity;

pub use error::TriageError;
pub use models::*;
pub use router::{create_triage_router, TriageState};
pub use services::{
    ClassificationRequest, ClassifierOutput, DiagnosisReportService, GeminiClassifier,
    TriageClassifier, TriageService,
};
pub use severity::{priority_level_for_score, SeverityRank};
