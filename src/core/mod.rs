// Quiz flow exports
pub mod auto_advance;
pub mod catalog;
pub mod phone;
pub mod session;
pub mod validator;
pub mod wizard;

pub use auto_advance::{AutoAdvance, ScheduledAdvance};
pub use catalog::{CatalogError, QuestionCatalog, PHONE_QUESTION_ID};
pub use phone::{PhoneVerification, PhoneVerifier, SimulatedVerifier, VerificationError, VerificationStep};
pub use session::{decode_credential, GoogleClaims, Landing, Session, SessionError};
pub use validator::validate;
pub use wizard::{Progress, StepOutcome, Wizard, WizardError, WizardOptions, WizardStep};
