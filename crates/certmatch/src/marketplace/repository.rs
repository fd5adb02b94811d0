use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ConsultantProfile, Inquiry, InquiryId, InquiryStatus, UserAccount, UserId};

/// Error enumeration shared by all record stores.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction for user accounts.
pub trait UserRepository: Send + Sync {
    fn insert(&self, account: UserAccount) -> Result<UserAccount, RepositoryError>;
    /// Removes an account row. Only the signup saga compensates through this;
    /// accounts are never deleted in-band.
    fn delete(&self, id: &UserId) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError>;
    fn fetch_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError>;
}

/// Storage abstraction for consultant profiles (one per consultant account).
pub trait ProfileRepository: Send + Sync {
    fn insert(&self, profile: ConsultantProfile) -> Result<ConsultantProfile, RepositoryError>;
    /// Whole-record replace. Implementations must apply it atomically with
    /// respect to concurrent updates of the same profile.
    fn update(&self, profile: ConsultantProfile) -> Result<ConsultantProfile, RepositoryError>;
    fn fetch(&self, user_id: &UserId) -> Result<Option<ConsultantProfile>, RepositoryError>;
    fn verified(&self) -> Result<Vec<ConsultantProfile>, RepositoryError>;
}

/// Storage abstraction for inquiries.
///
/// No ordering is guaranteed by the list methods; the inquiry service sorts
/// before anything reaches a caller.
pub trait InquiryRepository: Send + Sync {
    fn insert(&self, inquiry: Inquiry) -> Result<Inquiry, RepositoryError>;
    fn fetch(&self, id: &InquiryId) -> Result<Option<Inquiry>, RepositoryError>;
    /// Compare-and-set status change. Fails with [`RepositoryError::Conflict`]
    /// when the stored status no longer equals `expected`, so two racing
    /// transitions on one record cannot both win.
    fn update_status(
        &self,
        id: &InquiryId,
        expected: InquiryStatus,
        next: InquiryStatus,
        at: DateTime<Utc>,
    ) -> Result<Inquiry, RepositoryError>;
    fn list_all(&self) -> Result<Vec<Inquiry>, RepositoryError>;
    fn list_for_company(&self, company_id: &UserId) -> Result<Vec<Inquiry>, RepositoryError>;
    fn list_for_consultant(&self, consultant_id: &UserId) -> Result<Vec<Inquiry>, RepositoryError>;
}

/// Domain events emitted by the inquiry lifecycle.
///
/// Notification delivery is intentionally not implemented; this hook exists so
/// a transport can be wired in without touching the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketplaceEvent {
    InquiryAccepted {
        inquiry_id: InquiryId,
        company_id: UserId,
        consultant_id: UserId,
    },
}

/// Outbound event hook (e-mail bridge, admin feed, and the like).
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: MarketplaceEvent) -> Result<(), EventError>;
}

/// Event dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}
