//! Blindl Quiz - onboarding questionnaire for the Blindl dating app
//!
//! This library drives the sign-up quiz: a step-by-step wizard with per-question
//! validation, client-side profile persistence, and the submission backend that
//! stores one quiz per email.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{validate, QuestionCatalog, Session, StepOutcome, Wizard, WizardOptions, WizardStep};
pub use models::{AnswerSet, AnswerValue, ProfileStatus, Question, Submission, SubmitQuizRequest, UserProfile};
