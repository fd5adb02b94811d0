//! Two-phase account creation across the auth directory and the record
//! store, with compensating deletes on partial failure.
//!
//! The two systems share no transaction, so this is modeled as a saga: each
//! completed step pushes an undo action, and any later failure unwinds the
//! stack in reverse before the error reaches the caller. Callers see one
//! aggregated failure and no orphaned records.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use super::domain::{ConsultantProfile, UserAccount, UserId, UserRole};
use super::identity::{AuthDirectory, AuthError};
use super::repository::{ProfileRepository, RepositoryError, UserRepository};

/// Inbound signup payload. `role` arrives as free text and is parsed against
/// [`UserRole`]; headline and bio only matter for consultants, where they
/// seed the fresh profile.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Error raised by the signup saga.
#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("invalid role '{0}'")]
    InvalidRole(String),
    #[error("an account with this email already exists")]
    EmailInUse,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One undo action recorded by a completed saga step.
struct Compensation {
    label: &'static str,
    undo: Box<dyn FnOnce() -> Result<(), String>>,
}

fn unwind(stack: Vec<Compensation>) {
    for compensation in stack.into_iter().rev() {
        if let Err(detail) = (compensation.undo)() {
            // Best effort: a failed compensation leaves an orphan we can only
            // report, not repair, from this request.
            warn!(step = compensation.label, "signup compensation failed: {detail}");
        }
    }
}

/// Creates accounts across both backing systems as a single logical unit.
pub struct SignupService {
    directory: Arc<dyn AuthDirectory>,
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl SignupService {
    pub fn new(
        directory: Arc<dyn AuthDirectory>,
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            directory,
            users,
            profiles,
        }
    }

    pub fn signup(&self, request: SignupRequest) -> Result<UserAccount, SignupError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(SignupError::MissingField("name"));
        }
        let email = request.email.trim();
        if email.is_empty() {
            return Err(SignupError::MissingField("email"));
        }
        if request.password.is_empty() {
            return Err(SignupError::MissingField("password"));
        }
        let role = UserRole::parse(&request.role)
            .ok_or_else(|| SignupError::InvalidRole(request.role.clone()))?;

        if self.users.fetch_by_email(email)?.is_some() {
            return Err(SignupError::EmailInUse);
        }

        let mut compensations: Vec<Compensation> = Vec::new();

        let credential = self.directory.provision(email, &request.password)?;
        compensations.push(self.undo_provision(credential.user_id.clone()));

        let now = Utc::now();
        let account = UserAccount {
            id: credential.user_id.clone(),
            role,
            name: name.to_string(),
            email: email.to_string(),
            credential_hash: credential.credential_hash,
            created_at: now,
        };

        let account = match self.users.insert(account) {
            Ok(account) => account,
            Err(err) => {
                unwind(compensations);
                return Err(err.into());
            }
        };
        compensations.push(self.undo_account(account.id.clone()));

        if role == UserRole::Consultant {
            let profile =
                ConsultantProfile::new(account.id.clone(), request.headline, request.bio, now);
            if let Err(err) = self.profiles.insert(profile) {
                unwind(compensations);
                return Err(err.into());
            }
        }

        Ok(account)
    }

    fn undo_provision(&self, user_id: UserId) -> Compensation {
        let directory = Arc::clone(&self.directory);
        Compensation {
            label: "auth directory provision",
            undo: Box::new(move || {
                directory
                    .remove(&user_id)
                    .map_err(|err| err.to_string())
            }),
        }
    }

    fn undo_account(&self, user_id: UserId) -> Compensation {
        let users = Arc::clone(&self.users);
        Compensation {
            label: "account insert",
            undo: Box::new(move || users.delete(&user_id).map_err(|err| err.to_string())),
        }
    }
}
