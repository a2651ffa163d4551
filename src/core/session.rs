use crate::core::catalog::QuestionCatalog;
use crate::core::wizard::{Wizard, WizardOptions};
use crate::models::UserProfile;
use crate::services::{PersistenceClient, StoreError};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while signing in or restoring a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid credential: {0}")]
    InvalidCredential(#[from] jsonwebtoken::errors::Error),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Identity claims carried by a Google ID token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoogleClaims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

impl GoogleClaims {
    pub fn into_profile(self) -> UserProfile {
        UserProfile::new(self.sub, self.email, self.name, self.picture)
    }
}

/// Read the identity claims of a Google credential
///
/// The signature is not checked; the credential only selects which stored
/// profile to open.
pub fn decode_credential(credential: &str) -> Result<GoogleClaims, SessionError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<GoogleClaims>(credential, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// Which view a signed-in user lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    Wizard,
    Status,
}

/// A signed-in user
pub struct Session {
    store: PersistenceClient,
    credential: String,
    profile: UserProfile,
}

impl Session {
    /// Sign in with a fresh credential and remember it
    pub async fn sign_in(store: PersistenceClient, credential: &str) -> Result<Self, SessionError> {
        let claims = decode_credential(credential)?;
        store.save_token(credential).await?;

        let profile = match store.load(&claims.email).await? {
            Some(existing) => existing,
            None => claims.into_profile(),
        };
        tracing::info!("Signed in {}", profile.email);

        Ok(Self {
            store,
            credential: credential.to_string(),
            profile,
        })
    }

    /// Restore the remembered session, if any
    ///
    /// An unreadable remembered credential is discarded.
    pub async fn restore(store: PersistenceClient) -> Result<Option<Self>, SessionError> {
        let Some(credential) = store.load_token().await? else {
            return Ok(None);
        };

        match Self::sign_in(store.clone(), &credential).await {
            Ok(session) => Ok(Some(session)),
            Err(SessionError::InvalidCredential(e)) => {
                tracing::warn!("Discarding unreadable stored credential: {}", e);
                store.clear_token().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn landing(&self) -> Landing {
        if self.profile.has_answers() {
            Landing::Status
        } else {
            Landing::Wizard
        }
    }

    /// Open the quiz for this user
    pub fn start_wizard(&self, catalog: Arc<QuestionCatalog>, options: WizardOptions) -> Wizard {
        Wizard::from_profile(catalog, self.profile.clone(), self.store.clone()).with_options(options)
    }

    /// Forget the remembered credential and reset the open wizard; stored
    /// profiles are kept
    pub async fn logout(self, wizard: &mut Wizard) -> Result<(), SessionError> {
        self.store.clear_token().await?;
        wizard.reset();
        tracing::info!("Signed out {}", self.profile.email);
        Ok(())
    }
}
