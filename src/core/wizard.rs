use crate::config::WizardSettings;
use crate::core::auto_advance::{AutoAdvance, DEFAULT_AUTO_ADVANCE_DELAY};
use crate::core::catalog::{QuestionCatalog, PHONE_QUESTION_ID};
use crate::core::validator::{is_blank, validate};
use crate::models::{
    AnswerSet, AnswerValue, ProfileStatus, Question, SubmitQuizRequest, UserProfile,
    ValidationError, ValidationErrorSet,
};
use crate::services::{PersistenceClient, RelayError, StoreError, SubmissionClient};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that stop a wizard operation
///
/// Invalid answers are not errors; they are reported through
/// [`StepOutcome::Invalid`] and the wizard's error set.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Failed to save profile: {0}")]
    Persistence(#[from] StoreError),

    #[error("Failed to relay submission: {0}")]
    Relay(#[from] RelayError),
}

/// Position in the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Question(usize),
    Completed,
}

/// Result of an advance attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The current answer failed validation; the wizard did not move
    Invalid { field: String, message: String },
    /// Moved to the question at this index
    Moved(usize),
    /// The phone answer is valid but must be verified before moving on
    PhoneVerificationRequired { phone: String },
    /// The quiz was submitted
    Completed,
    /// The wizard had already completed
    AlreadyCompleted,
}

/// Progress through the flow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub percent: f64,
}

/// Behavior switches for a wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardOptions {
    pub auto_advance_delay: Duration,
    /// Hold the flow on the phone question until a number is confirmed
    pub require_phone_verification: bool,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self {
            auto_advance_delay: DEFAULT_AUTO_ADVANCE_DELAY,
            require_phone_verification: false,
        }
    }
}

impl From<&WizardSettings> for WizardOptions {
    fn from(settings: &WizardSettings) -> Self {
        Self {
            auto_advance_delay: Duration::from_millis(settings.auto_advance_delay_ms),
            require_phone_verification: settings.require_phone_verification,
        }
    }
}

/// Backend the finished quiz is relayed to
struct RemoteSubmission {
    client: Arc<SubmissionClient>,
    token: String,
}

/// Multi-step quiz state machine
///
/// One question per step. Advancing validates the current answer; advancing
/// from the last step submits the profile and moves to
/// [`WizardStep::Completed`]. The wizard owns its state exclusively and
/// persists only through the injected [`PersistenceClient`].
pub struct Wizard {
    catalog: Arc<QuestionCatalog>,
    profile: UserProfile,
    store: PersistenceClient,
    relay: Option<RemoteSubmission>,
    options: WizardOptions,
    step: WizardStep,
    answers: AnswerSet,
    errors: ValidationErrorSet,
    auto_advance: AutoAdvance,
}

impl Wizard {
    /// Start a fresh flow at the first question
    pub fn new(catalog: Arc<QuestionCatalog>, profile: UserProfile, store: PersistenceClient) -> Self {
        let options = WizardOptions::default();
        Self {
            catalog,
            profile,
            store,
            relay: None,
            options,
            step: WizardStep::Question(0),
            answers: AnswerSet::new(),
            errors: ValidationErrorSet::new(),
            auto_advance: AutoAdvance::new(options.auto_advance_delay),
        }
    }

    /// Build a wizard for a known profile; submitted profiles open on the
    /// status view instead of the first question
    pub fn from_profile(
        catalog: Arc<QuestionCatalog>,
        profile: UserProfile,
        store: PersistenceClient,
    ) -> Self {
        let submitted = profile.has_answers();
        let answers = profile.answers.clone().unwrap_or_default();
        let mut wizard = Self::new(catalog, profile, store);

        if submitted {
            tracing::debug!("Profile {} already submitted, opening status view", wizard.profile.email);
            wizard.answers = answers;
            wizard.step = WizardStep::Completed;
        }
        wizard
    }

    /// Load any persisted profile for `identity.email` and build the wizard
    /// from it, falling back to `identity` for first-time users
    pub async fn resume(
        catalog: Arc<QuestionCatalog>,
        identity: UserProfile,
        store: PersistenceClient,
    ) -> Result<Self, WizardError> {
        let profile = store.load(&identity.email).await?.unwrap_or(identity);
        Ok(Self::from_profile(catalog, profile, store))
    }

    pub fn with_options(mut self, options: WizardOptions) -> Self {
        self.options = options;
        self.auto_advance = AutoAdvance::new(options.auto_advance_delay);
        self
    }

    /// Relay the finished quiz to the submission service before saving it
    pub fn with_relay(mut self, client: Arc<SubmissionClient>, token: impl Into<String>) -> Self {
        self.relay = Some(RemoteSubmission {
            client,
            token: token.into(),
        });
        self
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.step {
            WizardStep::Question(index) => Some(index),
            WizardStep::Completed => None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_index().and_then(|index| self.catalog.get(index))
    }

    pub fn is_completed(&self) -> bool {
        self.step == WizardStep::Completed
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn answer(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers.get(question_id)
    }

    pub fn errors(&self) -> &ValidationErrorSet {
        &self.errors
    }

    pub fn error_for(&self, question_id: &str) -> Option<&ValidationError> {
        self.errors.get(question_id)
    }

    pub fn auto_advance_pending(&self) -> bool {
        self.auto_advance.is_pending()
    }

    pub fn progress(&self) -> Progress {
        let total = self.catalog.len();
        let current = self.current_index().unwrap_or(total);
        let shown = (current + 1).min(total);
        Progress {
            current,
            total,
            percent: shown as f64 / total as f64 * 100.0,
        }
    }

    /// Whether "Next" is enabled: a required current answer is present and
    /// the current question has no recorded error
    pub fn can_proceed(&self) -> bool {
        let Some(question) = self.current_question() else {
            return false;
        };
        let answered = !question.required || !is_blank(self.answers.get(&question.id));
        answered && !self.errors.contains_key(&question.id)
    }

    /// Record an answer for any question
    ///
    /// Clears that question's error and any auto-advance it armed. A valid
    /// single-choice answer to the current question arms a new auto-advance.
    pub fn set_answer(
        &mut self,
        question_id: &str,
        value: impl Into<AnswerValue>,
    ) -> Result<(), WizardError> {
        let catalog = Arc::clone(&self.catalog);
        let (index, question) = catalog
            .position(question_id)
            .ok_or_else(|| WizardError::UnknownQuestion(question_id.to_string()))?;

        self.answers.insert(question.id.clone(), value.into());
        self.errors.remove(&question.id);
        if self.auto_advance.cancel_for(&question.id) {
            tracing::debug!("Cancelled pending auto-advance for {}", question.id);
        }

        if question.is_single_choice()
            && self.step == WizardStep::Question(index)
            && validate(question, self.answers.get(&question.id)).is_none()
        {
            self.auto_advance.schedule(&question.id, index);
        }

        Ok(())
    }

    /// Validate the current answer and move forward
    pub async fn advance(&mut self) -> Result<StepOutcome, WizardError> {
        self.auto_advance.cancel();

        let WizardStep::Question(index) = self.step else {
            return Ok(StepOutcome::AlreadyCompleted);
        };
        let catalog = Arc::clone(&self.catalog);
        let Some(question) = catalog.get(index) else {
            return Ok(StepOutcome::AlreadyCompleted);
        };

        if let Some(message) = validate(question, self.answers.get(&question.id)) {
            return Ok(self.reject(question, message));
        }
        self.errors.remove(&question.id);

        if self.options.require_phone_verification
            && question.id == PHONE_QUESTION_ID
            && self.profile.phone_number.is_none()
        {
            let phone = self
                .answers
                .get(&question.id)
                .map(|v| v.as_text().into_owned())
                .unwrap_or_default();
            tracing::debug!("Phone verification required before leaving step {}", index);
            return Ok(StepOutcome::PhoneVerificationRequired { phone });
        }

        if index + 1 < catalog.len() {
            self.step = WizardStep::Question(index + 1);
            tracing::debug!("Advanced to step {}", index + 1);
            return Ok(StepOutcome::Moved(index + 1));
        }

        // Earlier answers may have been edited since their step was passed.
        if let Some((position, message)) = self.first_invalid_answer() {
            self.step = WizardStep::Question(position);
            return Ok(self.reject(&catalog.questions()[position], message));
        }

        self.submit().await?;
        Ok(StepOutcome::Completed)
    }

    /// Go back one question; back navigation never re-validates
    pub fn retreat(&mut self) -> bool {
        match self.step {
            WizardStep::Question(index) if index > 0 => {
                self.auto_advance.cancel();
                self.errors.clear();
                self.step = WizardStep::Question(index - 1);
                true
            }
            _ => false,
        }
    }

    /// Record a verified phone number, releasing the phone gate
    pub fn confirm_phone(&mut self, phone_number: impl Into<String>) {
        let phone_number = phone_number.into();
        tracing::info!("Phone number verified for {}", self.profile.email);
        self.profile.phone_number = Some(phone_number);
    }

    /// Wait for a pending auto-advance and perform it
    ///
    /// Returns `Ok(None)` when nothing was pending or the wizard moved away from
    /// the step that armed it. Cancel safe.
    pub async fn run_auto_advance(&mut self) -> Result<Option<StepOutcome>, WizardError> {
        let Some(scheduled) = self.auto_advance.expired().await else {
            return Ok(None);
        };

        if self.step != WizardStep::Question(scheduled.step) {
            tracing::debug!("Dropping stale auto-advance for {}", scheduled.question_id);
            return Ok(None);
        }

        self.advance().await.map(Some)
    }

    /// Discard any pending auto-advance, as when the view is torn down
    pub fn close(&mut self) {
        if self.auto_advance.cancel().is_some() {
            tracing::debug!("Cancelled pending auto-advance on close");
        }
    }

    /// Forget all answers and errors and return to the first question
    pub fn reset(&mut self) {
        self.auto_advance.cancel();
        self.answers.clear();
        self.errors.clear();
        self.step = WizardStep::Question(0);
        self.profile.answers = None;
        self.profile.submitted_at = None;
        self.profile.status = ProfileStatus::Pending;
    }

    fn reject(&mut self, question: &Question, message: String) -> StepOutcome {
        tracing::debug!("Validation failed for {}: {}", question.id, message);
        self.errors.clear();
        self.errors.insert(
            question.id.clone(),
            ValidationError {
                field: question.id.clone(),
                message: message.clone(),
            },
        );
        StepOutcome::Invalid {
            field: question.id.clone(),
            message,
        }
    }

    fn first_invalid_answer(&self) -> Option<(usize, String)> {
        self.catalog.iter().enumerate().find_map(|(position, question)| {
            validate(question, self.answers.get(&question.id)).map(|message| (position, message))
        })
    }

    async fn submit(&mut self) -> Result<(), WizardError> {
        let mut profile = self.profile.clone();
        if profile.phone_number.is_none() {
            profile.phone_number = self
                .answers
                .get(PHONE_QUESTION_ID)
                .map(|v| v.as_text().into_owned())
                .filter(|phone| !phone.is_empty());
        }
        profile.answers = Some(self.answers.clone());
        profile.status = ProfileStatus::Pending;
        profile.submitted_at = Some(chrono::Utc::now());

        if let Some(remote) = &self.relay {
            let request = SubmitQuizRequest::from_profile(&profile);
            if let Err(e) = remote.client.submit(&remote.token, &request).await {
                tracing::error!("Failed to relay quiz for {}: {}", profile.email, e);
                return Err(e.into());
            }
        }

        if let Err(e) = self.store.save(&profile).await {
            tracing::error!("Failed to save quiz for {}: {}", profile.email, e);
            return Err(e.into());
        }

        tracing::info!("Quiz submitted for {}", profile.email);
        self.profile = profile;
        self.errors.clear();
        self.step = WizardStep::Completed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionKind, ValidationRule};

    fn small_catalog() -> Arc<QuestionCatalog> {
        Arc::new(
            QuestionCatalog::new(vec![
                Question::new("gender", QuestionKind::Select, "What is your gender?")
                    .with_options(["Male", "Female"])
                    .required(),
                Question::new("age", QuestionKind::Number, "How old are you?")
                    .with_rule(ValidationRule::Age)
                    .required(),
                Question::new("nickname", QuestionKind::Text, "Nickname?"),
            ])
            .unwrap(),
        )
    }

    fn wizard() -> Wizard {
        let profile = UserProfile::new("sub-1", "ana@example.com", "Ana", "");
        Wizard::new(small_catalog(), profile, PersistenceClient::in_memory())
    }

    #[tokio::test]
    async fn test_invalid_answer_keeps_step() {
        let mut wizard = wizard();
        wizard.set_answer("gender", "Female").unwrap();
        wizard.advance().await.unwrap();
        wizard.set_answer("age", "17").unwrap();

        let outcome = wizard.advance().await.unwrap();

        assert_eq!(
            outcome,
            StepOutcome::Invalid {
                field: "age".to_string(),
                message: "You must be at least 18 years old".to_string()
            }
        );
        assert_eq!(wizard.step(), WizardStep::Question(1));
        assert_eq!(wizard.errors().len(), 1);
        assert!(!wizard.can_proceed());
    }

    #[tokio::test]
    async fn test_edit_clears_error() {
        let mut wizard = wizard();
        wizard.advance().await.unwrap();
        assert!(wizard.error_for("gender").is_some());

        wizard.set_answer("gender", "Male").unwrap();

        assert!(wizard.error_for("gender").is_none());
        assert!(wizard.can_proceed());
    }

    #[test]
    fn test_unknown_question_rejected() {
        let mut wizard = wizard();
        assert!(matches!(
            wizard.set_answer("favoriteColor", "blue"),
            Err(WizardError::UnknownQuestion(_))
        ));
    }

    #[tokio::test]
    async fn test_retreat_clears_errors() {
        let mut wizard = wizard();
        assert!(!wizard.retreat());

        wizard.set_answer("gender", "Female").unwrap();
        wizard.advance().await.unwrap();
        wizard.advance().await.unwrap();
        assert_eq!(wizard.errors().len(), 1);

        assert!(wizard.retreat());
        assert_eq!(wizard.step(), WizardStep::Question(0));
        assert!(wizard.errors().is_empty());
    }

    #[tokio::test]
    async fn test_progress_reporting() {
        let mut wizard = wizard();
        let start = wizard.progress();
        assert_eq!(start.current, 0);
        assert!((start.percent - 100.0 / 3.0).abs() < 1e-9);

        wizard.set_answer("gender", "Female").unwrap();
        wizard.advance().await.unwrap();
        assert_eq!(wizard.progress().current, 1);
    }

    #[tokio::test]
    async fn test_optional_last_step_completes() {
        let mut wizard = wizard();
        wizard.set_answer("gender", "Female").unwrap();
        wizard.advance().await.unwrap();
        wizard.set_answer("age", "30").unwrap();
        wizard.advance().await.unwrap();

        assert_eq!(wizard.advance().await.unwrap(), StepOutcome::Completed);
        assert!(wizard.is_completed());
        assert_eq!(wizard.advance().await.unwrap(), StepOutcome::AlreadyCompleted);
        assert_eq!(wizard.progress().percent, 100.0);
    }

    #[tokio::test]
    async fn test_edited_earlier_answer_blocks_completion() {
        let mut wizard = wizard();
        wizard.set_answer("gender", "Female").unwrap();
        wizard.advance().await.unwrap();
        wizard.set_answer("age", "30").unwrap();
        wizard.advance().await.unwrap();

        wizard.set_answer("age", "12").unwrap();
        let outcome = wizard.advance().await.unwrap();

        assert!(matches!(outcome, StepOutcome::Invalid { ref field, .. } if field == "age"));
        assert_eq!(wizard.step(), WizardStep::Question(1));
        assert!(!wizard.is_completed());
    }

    #[tokio::test]
    async fn test_reset_returns_to_start() {
        let mut wizard = wizard();
        wizard.set_answer("gender", "Female").unwrap();
        wizard.advance().await.unwrap();

        wizard.reset();

        assert_eq!(wizard.step(), WizardStep::Question(0));
        assert!(wizard.answers().is_empty());
        assert!(!wizard.auto_advance_pending());
    }

    #[test]
    fn test_options_from_settings() {
        let settings = WizardSettings {
            auto_advance_delay_ms: 450,
            phone_verification_delay_ms: 1000,
            require_phone_verification: true,
        };
        let options = WizardOptions::from(&settings);

        assert_eq!(options.auto_advance_delay, Duration::from_millis(450));
        assert!(options.require_phone_verification);
    }
}
