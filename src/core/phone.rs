use crate::config::WizardSettings;
use crate::core::validator::normalize_phone;
use crate::models::{AnswerValue, ValidationRule};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the phone verification flow
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Invalid phone number: {0}")]
    InvalidNumber(String),

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("No verification code has been sent")]
    CodeNotSent,

    #[error("Verification provider error: {0}")]
    Provider(String),
}

/// Where the user is in the verification flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStep {
    Input,
    CodeSent,
    Complete,
}

/// Sends and checks one-time phone codes
#[async_trait]
pub trait PhoneVerifier: Send + Sync {
    async fn send_code(&self, phone: &str) -> Result<(), VerificationError>;

    async fn check_code(&self, phone: &str, code: &str) -> Result<bool, VerificationError>;
}

/// Stand-in verifier: waits a fixed delay and accepts any six-digit code
#[derive(Debug, Clone)]
pub struct SimulatedVerifier {
    delay: Duration,
}

impl SimulatedVerifier {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedVerifier {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl From<&WizardSettings> for SimulatedVerifier {
    fn from(settings: &WizardSettings) -> Self {
        Self::new(Duration::from_millis(settings.phone_verification_delay_ms))
    }
}

#[async_trait]
impl PhoneVerifier for SimulatedVerifier {
    async fn send_code(&self, phone: &str) -> Result<(), VerificationError> {
        tokio::time::sleep(self.delay).await;
        tracing::debug!("Simulated verification code sent to {}", phone);
        Ok(())
    }

    async fn check_code(&self, _phone: &str, code: &str) -> Result<bool, VerificationError> {
        tokio::time::sleep(self.delay).await;
        Ok(code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()))
    }
}

/// Verification of one phone number
///
/// Each step is an ordinary future: dropping it before it resolves abandons
/// the step and leaves the flow where it was.
pub struct PhoneVerification {
    verifier: Arc<dyn PhoneVerifier>,
    phone: String,
    step: VerificationStep,
}

impl PhoneVerification {
    pub fn new(verifier: Arc<dyn PhoneVerifier>, phone: impl Into<String>) -> Self {
        Self {
            verifier,
            phone: phone.into(),
            step: VerificationStep::Input,
        }
    }

    pub fn step(&self) -> VerificationStep {
        self.step
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Correct the number before a code is sent
    pub fn set_phone(&mut self, phone: impl Into<String>) {
        self.phone = phone.into();
        self.step = VerificationStep::Input;
    }

    /// Send a code to the current number; may be repeated to resend
    pub async fn request_code(&mut self) -> Result<(), VerificationError> {
        if let Some(message) = ValidationRule::Phone.check(Some(&AnswerValue::from(self.phone.as_str()))) {
            return Err(VerificationError::InvalidNumber(message));
        }

        self.verifier.send_code(&normalize_phone(&self.phone)).await?;
        self.step = VerificationStep::CodeSent;
        Ok(())
    }

    /// Check a code; on success the flow is complete
    pub async fn verify(&mut self, code: &str) -> Result<(), VerificationError> {
        match self.step {
            VerificationStep::Input => return Err(VerificationError::CodeNotSent),
            VerificationStep::Complete => return Ok(()),
            VerificationStep::CodeSent => {}
        }

        if self.verifier.check_code(&normalize_phone(&self.phone), code.trim()).await? {
            self.step = VerificationStep::Complete;
            Ok(())
        } else {
            Err(VerificationError::InvalidCode)
        }
    }

    /// The verified number, once the flow is complete
    pub fn verified_number(&self) -> Option<&str> {
        (self.step == VerificationStep::Complete).then_some(self.phone.as_str())
    }
}
