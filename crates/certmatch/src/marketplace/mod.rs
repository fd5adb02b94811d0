//! Marketplace core: accounts, consultant profiles, the inquiry lifecycle,
//! and the directory over verified consultants.
//!
//! The module is split the way requests flow: [`identity`] resolves the
//! caller, [`signup`] creates accounts across two backing systems,
//! [`profiles`] and [`inquiries`] enforce the access rules, [`lifecycle`]
//! holds the status state machine, [`directory`] filters listings, and
//! [`router`] is the HTTP surface over all of it.

pub mod directory;
pub mod domain;
pub mod identity;
pub mod inquiries;
pub mod lifecycle;
pub mod profiles;
pub mod repository;
pub mod router;
pub mod signup;

#[cfg(test)]
mod tests;

pub use directory::DirectoryQuery;
pub use domain::{
    ConsultantListing, ConsultantProfile, CreateInquiry, EngagementMode, Inquiry, InquiryId,
    InquiryStatus, InquiryView, PartyView, ProfilePatch, UserAccount, UserId, UserRole,
};
pub use identity::{
    AuthDirectory, AuthError, Identity, IdentityProvider, IdentityResolver, ProvisionedCredential,
    RequestCredentials,
};
pub use inquiries::{InquiryError, InquiryService};
pub use lifecycle::{check_transition, InquiryActor, TransitionDenied};
pub use profiles::{ProfileError, ProfileService};
pub use repository::{
    EventError, EventPublisher, InquiryRepository, MarketplaceEvent, ProfileRepository,
    RepositoryError, UserRepository,
};
pub use router::{marketplace_router, MarketplaceState};
pub use signup::{SignupError, SignupRequest, SignupService};
