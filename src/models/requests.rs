use crate::models::domain::{AnswerSet, UserProfile};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to submit a finished quiz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[serde(alias = "user_id", rename = "userId", default)]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "phone_number", rename = "phoneNumber", default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub answers: AnswerSet,
}

impl SubmitQuizRequest {
    /// Build the relay payload from a completed profile
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.id.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            phone_number: profile.phone_number.clone(),
            answers: profile.answers.clone().unwrap_or_default(),
        }
    }
}
