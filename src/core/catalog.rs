use crate::models::{Question, QuestionKind, ValidationRule};
use std::collections::HashSet;
use thiserror::Error;

/// Id of the question that may be gated behind phone verification
pub const PHONE_QUESTION_ID: &str = "phone";

/// Errors raised when building a catalog
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Catalog has no questions")]
    Empty,

    #[error("Duplicate question id: {0}")]
    DuplicateId(String),

    #[error("Question {0} needs at least one option")]
    MissingOptions(String),
}

/// Ordered, immutable list of quiz questions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    /// Build a catalog, rejecting empty lists, duplicate ids and choice
    /// questions without options
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.id.as_str()) {
                return Err(CatalogError::DuplicateId(question.id.clone()));
            }
            let is_choice = matches!(question.kind, QuestionKind::Select | QuestionKind::MultiSelect);
            if is_choice && question.options.is_empty() {
                return Err(CatalogError::MissingOptions(question.id.clone()));
            }
        }

        Ok(Self { questions })
    }

    /// The eleven onboarding questions asked by the product
    pub fn standard() -> Self {
        Self {
            questions: standard_questions(),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Step index and definition of a question
    pub fn position(&self, id: &str) -> Option<(usize, &Question)> {
        self.questions.iter().enumerate().find(|(_, q)| q.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_questions() -> Vec<Question> {
    vec![
        Question::new("gender", QuestionKind::Select, "What is your gender?")
            .with_options(["Male", "Female", "Non-binary", "Prefer not to say"])
            .required(),
        Question::new("name", QuestionKind::Text, "What is your name?")
            .with_placeholder("Enter your full name")
            .required(),
        Question::new("age", QuestionKind::Number, "How old are you?")
            .with_placeholder("Enter your age")
            .with_rule(ValidationRule::Age)
            .required(),
        Question::new(PHONE_QUESTION_ID, QuestionKind::Tel, "What is your phone number?")
            .with_placeholder("Enter your phone number")
            .with_rule(ValidationRule::Phone)
            .required(),
        Question::new("orientation", QuestionKind::Select, "What is your sexual orientation?")
            .with_options([
                "Straight",
                "Gay",
                "Lesbian",
                "Bisexual",
                "Pansexual",
                "Asexual",
                "Other",
                "Prefer not to say",
            ])
            .required(),
        Question::new("relationshipGoals", QuestionKind::Select, "What are your relationship goals?")
            .with_options([
                "Long-term relationship",
                "Marriage",
                "Casual dating",
                "Friendship first",
                "Not sure yet",
            ])
            .required(),
        Question::new("drinkingSmoking", QuestionKind::Select, "Do you drink or smoke?")
            .with_options([
                "I drink occasionally",
                "I drink regularly",
                "I smoke occasionally",
                "I smoke regularly",
                "I don't drink or smoke",
                "I prefer not to say",
            ])
            .required(),
        Question::new(
            "availableDates",
            QuestionKind::MultiSelect,
            "Which dates work for you? (Select all that apply)",
        )
        .with_options([
            "Weekday evenings",
            "Weekend afternoons",
            "Weekend evenings",
            "Weekday lunches",
            "Flexible schedule",
        ])
        .with_rule(ValidationRule::AtLeastOne)
        .required(),
        Question::new(
            "selfDescription",
            QuestionKind::Textarea,
            "Give a brief description of yourself. Hobbies, work, etc.",
        )
        .with_placeholder("Tell us about yourself...")
        .with_rule(ValidationRule::Description)
        .required(),
        Question::new(
            "idealPartner",
            QuestionKind::Textarea,
            "Give a brief description of your ideal partner. Green flags? Deal breakers?",
        )
        .with_placeholder("Describe your ideal partner...")
        .with_rule(ValidationRule::Description)
        .required(),
        Question::new("howDidYouFind", QuestionKind::Select, "How did you find out about this event?")
            .with_options([
                "Social media",
                "Friend recommendation",
                "Online search",
                "Event website",
                "Other",
            ])
            .required(),
    ]
}
