// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AnswerSet, AnswerValue, ProfileStatus, Question, QuestionKind, Submission, UserProfile,
    ValidationError, ValidationErrorSet, ValidationRule,
};
pub use requests::SubmitQuizRequest;
pub use responses::{ErrorResponse, HealthResponse, SubmitQuizResponse};
