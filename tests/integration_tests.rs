// Integration tests for Blindl Quiz

use async_trait::async_trait;
use blindl_quiz::core::{
    PhoneVerification, Session, SimulatedVerifier, StepOutcome, Wizard, WizardError,
    WizardOptions, WizardStep,
};
use blindl_quiz::core::session::Landing;
use blindl_quiz::models::{AnswerValue, UserProfile};
use blindl_quiz::services::{
    KeyValueStore, MemorySubmissionStore, PersistenceClient, StoreError, SubmissionClient,
    SubmissionStore,
};
use blindl_quiz::QuestionCatalog;
use std::sync::Arc;
use std::time::Duration;

fn identity() -> UserProfile {
    UserProfile::new("google-1", "ana@example.com", "Ana", "https://img/ana.png")
}

fn catalog() -> Arc<QuestionCatalog> {
    Arc::new(QuestionCatalog::standard())
}

fn valid_answer(question_id: &str) -> AnswerValue {
    match question_id {
        "gender" => "Female".into(),
        "name" => "Ana Lopez".into(),
        "age" => "27".into(),
        "phone" => "+1 (555) 123-4567".into(),
        "orientation" => "Straight".into(),
        "relationshipGoals" => "Long-term relationship".into(),
        "drinkingSmoking" => "I drink occasionally".into(),
        "availableDates" => vec!["Weekend evenings", "Flexible schedule"].into(),
        "selfDescription" => "Nurse who loves hiking and board games.".into(),
        "idealPartner" => "Kind, curious, and up for an adventure.".into(),
        "howDidYouFind" => "Friend recommendation".into(),
        other => panic!("no answer for {}", other),
    }
}

/// Answer the current question and advance, returning the outcome
async fn answer_and_advance(wizard: &mut Wizard) -> StepOutcome {
    let id = wizard.current_question().unwrap().id.clone();
    wizard.set_answer(&id, valid_answer(&id)).unwrap();
    wizard.advance().await.unwrap()
}

#[tokio::test]
async fn test_full_run_walks_every_step_then_completes() {
    let store = PersistenceClient::in_memory();
    let mut wizard = Wizard::new(catalog(), identity(), store.clone());
    let total = wizard.catalog().len();

    assert!(!wizard.retreat());
    assert_eq!(wizard.step(), WizardStep::Question(0));

    for expected in 1..total {
        assert_eq!(answer_and_advance(&mut wizard).await, StepOutcome::Moved(expected));
        assert_eq!(wizard.step(), WizardStep::Question(expected));
    }
    assert_eq!(answer_and_advance(&mut wizard).await, StepOutcome::Completed);
    assert!(wizard.is_completed());
    assert!(!wizard.auto_advance_pending());

    let saved = store.load("ana@example.com").await.unwrap().unwrap();
    assert_eq!(saved.answers.as_ref().unwrap().len(), total);
    assert_eq!(saved.phone_number.as_deref(), Some("+1 (555) 123-4567"));
    assert!(saved.submitted_at.is_some());
}

#[tokio::test]
async fn test_invalid_answer_records_single_error() {
    let mut wizard = Wizard::new(catalog(), identity(), PersistenceClient::in_memory());
    answer_and_advance(&mut wizard).await;
    answer_and_advance(&mut wizard).await;

    wizard.set_answer("age", "100").unwrap();
    let outcome = wizard.advance().await.unwrap();

    assert_eq!(
        outcome,
        StepOutcome::Invalid {
            field: "age".to_string(),
            message: "Please enter a valid age (18-99)".to_string(),
        }
    );
    assert_eq!(wizard.step(), WizardStep::Question(2));
    assert_eq!(wizard.errors().len(), 1);
    assert_eq!(
        wizard.error_for("age").unwrap().message,
        "Please enter a valid age (18-99)"
    );
}

#[tokio::test(start_paused = true)]
async fn test_single_choice_auto_advances_after_delay() {
    let mut wizard = Wizard::new(catalog(), identity(), PersistenceClient::in_memory());

    wizard.set_answer("gender", "Female").unwrap();
    assert!(wizard.auto_advance_pending());

    let started = tokio::time::Instant::now();
    let outcome = wizard.run_auto_advance().await.unwrap();

    assert_eq!(outcome, Some(StepOutcome::Moved(1)));
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(!wizard.auto_advance_pending());
}

#[tokio::test(start_paused = true)]
async fn test_new_edit_restarts_auto_advance() {
    let mut wizard = Wizard::new(catalog(), identity(), PersistenceClient::in_memory());

    wizard.set_answer("gender", "Female").unwrap();
    tokio::time::advance(Duration::from_millis(200)).await;
    wizard.set_answer("gender", "Male").unwrap();

    // The first selection would have fired by now.
    let early = tokio::time::timeout(Duration::from_millis(150), wizard.run_auto_advance()).await;
    assert!(early.is_err());
    assert_eq!(wizard.step(), WizardStep::Question(0));
    assert!(wizard.auto_advance_pending());

    assert_eq!(wizard.run_auto_advance().await.unwrap(), Some(StepOutcome::Moved(1)));
    assert_eq!(wizard.answer("gender"), Some(&AnswerValue::from("Male")));
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_auto_advance() {
    let mut wizard = Wizard::new(catalog(), identity(), PersistenceClient::in_memory());

    wizard.set_answer("gender", "Female").unwrap();
    wizard.close();

    assert_eq!(wizard.run_auto_advance().await.unwrap(), None);
    assert_eq!(wizard.step(), WizardStep::Question(0));
}

#[tokio::test(start_paused = true)]
async fn test_manual_advance_consumes_auto_advance() {
    let mut wizard = Wizard::new(catalog(), identity(), PersistenceClient::in_memory());

    wizard.set_answer("gender", "Female").unwrap();
    assert_eq!(wizard.advance().await.unwrap(), StepOutcome::Moved(1));

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(wizard.run_auto_advance().await.unwrap(), None);
    assert_eq!(wizard.step(), WizardStep::Question(1));
}

#[tokio::test(start_paused = true)]
async fn test_retreat_cancels_auto_advance() {
    let mut wizard = Wizard::new(catalog(), identity(), PersistenceClient::in_memory());
    for _ in 0..4 {
        answer_and_advance(&mut wizard).await;
    }
    assert_eq!(wizard.current_question().unwrap().id, "orientation");

    wizard.set_answer("orientation", "Bisexual").unwrap();
    assert!(wizard.auto_advance_pending());
    assert!(wizard.retreat());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(wizard.run_auto_advance().await.unwrap(), None);
    assert_eq!(wizard.step(), WizardStep::Question(3));
}

#[tokio::test(start_paused = true)]
async fn test_answering_other_step_does_not_auto_advance() {
    let mut wizard = Wizard::new(catalog(), identity(), PersistenceClient::in_memory());

    wizard.set_answer("orientation", "Straight").unwrap();
    assert!(!wizard.auto_advance_pending());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(wizard.run_auto_advance().await.unwrap(), None);
    assert_eq!(wizard.step(), WizardStep::Question(0));
    assert_eq!(wizard.answer("orientation"), Some(&AnswerValue::from("Straight")));
}

#[tokio::test]
async fn test_resume_opens_completed_for_submitted_profile() {
    let store = PersistenceClient::in_memory();
    let mut first = Wizard::new(catalog(), identity(), store.clone());
    while !first.is_completed() {
        answer_and_advance(&mut first).await;
    }

    let resumed = Wizard::resume(catalog(), identity(), store.clone()).await.unwrap();
    assert!(resumed.is_completed());
    assert_eq!(resumed.answer("age"), Some(&AnswerValue::from("27")));

    let stranger = UserProfile::new("google-2", "bo@example.com", "Bo", "");
    let fresh = Wizard::resume(catalog(), stranger, store).await.unwrap();
    assert_eq!(fresh.step(), WizardStep::Question(0));
}

struct OfflineStore;

#[async_trait]
impl KeyValueStore for OfflineStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), StoreError> {
        Err(redis::RedisError::from((redis::ErrorKind::IoError, "store offline")).into())
    }

    async fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_persistence_failure_keeps_last_step() {
    let store = PersistenceClient::new(Arc::new(OfflineStore));
    let mut wizard = Wizard::new(catalog(), identity(), store);
    let last = wizard.catalog().len() - 1;
    for _ in 0..last {
        answer_and_advance(&mut wizard).await;
    }

    let id = wizard.current_question().unwrap().id.clone();
    wizard.set_answer(&id, valid_answer(&id)).unwrap();
    let result = wizard.advance().await;

    assert!(matches!(result, Err(WizardError::Persistence(_))));
    assert_eq!(wizard.step(), WizardStep::Question(last));
    assert!(wizard.profile().answers.is_none());

    // Manual retry hits the same failure without losing answers.
    assert!(wizard.advance().await.is_err());
    assert_eq!(wizard.answers().len(), last + 1);
}

#[tokio::test]
async fn test_relay_failure_keeps_last_step() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/submit-quiz")
        .with_status(500)
        .with_body(r#"{"error":"Failed to save quiz"}"#)
        .create_async()
        .await;

    let store = PersistenceClient::in_memory();
    let client = Arc::new(SubmissionClient::new(server.url()).unwrap());
    let mut wizard = Wizard::new(catalog(), identity(), store.clone()).with_relay(client, "token-1");
    while wizard.current_index() != Some(wizard.catalog().len() - 1) {
        answer_and_advance(&mut wizard).await;
    }

    let id = wizard.current_question().unwrap().id.clone();
    wizard.set_answer(&id, valid_answer(&id)).unwrap();

    assert!(matches!(wizard.advance().await, Err(WizardError::Relay(_))));
    assert!(!wizard.is_completed());
    assert!(store.load("ana@example.com").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_phone_gate_holds_until_verified() {
    let options = WizardOptions {
        require_phone_verification: true,
        ..WizardOptions::default()
    };
    let mut wizard = Wizard::new(catalog(), identity(), PersistenceClient::in_memory())
        .with_options(options);
    for _ in 0..3 {
        answer_and_advance(&mut wizard).await;
    }

    let outcome = answer_and_advance(&mut wizard).await;
    let StepOutcome::PhoneVerificationRequired { phone } = outcome else {
        panic!("expected phone gate, got {:?}", outcome);
    };
    assert_eq!(wizard.step(), WizardStep::Question(3));

    let mut verification = PhoneVerification::new(Arc::new(SimulatedVerifier::default()), phone);
    verification.request_code().await.unwrap();
    verification.verify("123456").await.unwrap();
    wizard.confirm_phone(verification.verified_number().unwrap());

    assert_eq!(wizard.advance().await.unwrap(), StepOutcome::Moved(4));
}

fn credential() -> String {
    let claims = serde_json::json!({
        "sub": "google-1",
        "email": "ana@example.com",
        "name": "Ana",
        "picture": "https://img/ana.png"
    });
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"unused"),
    )
    .unwrap()
}

#[tokio::test]
async fn test_session_lands_on_status_after_submission() {
    let store = PersistenceClient::in_memory();
    let session = Session::sign_in(store.clone(), &credential()).await.unwrap();
    assert_eq!(session.landing(), Landing::Wizard);

    let mut wizard = session.start_wizard(catalog(), WizardOptions::default());
    while !wizard.is_completed() {
        answer_and_advance(&mut wizard).await;
    }

    let restored = Session::restore(store.clone()).await.unwrap().unwrap();
    assert_eq!(restored.landing(), Landing::Status);
    let mut status_view = restored.start_wizard(catalog(), WizardOptions::default());
    assert!(status_view.is_completed());

    restored.logout(&mut status_view).await.unwrap();
    assert_eq!(status_view.step(), WizardStep::Question(0));
    assert!(Session::restore(store.clone()).await.unwrap().is_none());
    assert!(store.load("ana@example.com").await.unwrap().is_some());
}

#[tokio::test]
async fn test_resubmission_resets_status_in_backend() {
    let submissions = MemorySubmissionStore::new();
    let mut wizard = Wizard::new(catalog(), identity(), PersistenceClient::in_memory());
    while !wizard.is_completed() {
        answer_and_advance(&mut wizard).await;
    }
    let mut request = blindl_quiz::SubmitQuizRequest::from_profile(wizard.profile());

    submissions.upsert(&request).await.unwrap();
    assert!(submissions
        .advance_status("ana@example.com", blindl_quiz::ProfileStatus::Matched)
        .await
        .unwrap());

    request.answers.insert("age".to_string(), "28".into());
    let saved = submissions.upsert(&request).await.unwrap();

    assert_eq!(saved.status, blindl_quiz::ProfileStatus::Pending);
    assert_eq!(saved.answers["age"], AnswerValue::from("28"));
    assert_eq!(submissions.len().await, 1);
}
