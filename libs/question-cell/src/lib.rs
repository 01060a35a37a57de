pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::QuestionError;
pub use models::*;
pub use router::create_question_router;
pub use services::QuestionBank;
