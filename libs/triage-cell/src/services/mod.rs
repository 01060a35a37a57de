pub mod classifier;
pub mod gemini;
pub mod reports;
pub mod triage;

pub use classifier::{ClassificationRequest, ClassifierOutput, TriageClassifier};
pub use gemini::GeminiClassifier;
pub use reports::DiagnosisReportService;
pub use triage::TriageService;
