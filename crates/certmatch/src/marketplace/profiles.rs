use std::sync::Arc;

use chrono::Utc;

use super::domain::{ConsultantListing, ConsultantProfile, ProfilePatch, UserId, UserRole};
use super::identity::Identity;
use super::repository::{ProfileRepository, RepositoryError, UserRepository};

/// Service guarding consultant profile reads and writes.
///
/// Visibility rule: owner and admin always see a profile; everyone else sees
/// it only once an admin has verified it. A hidden profile is reported as
/// missing so outsiders cannot probe for unverified accounts.
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

/// Error raised by the profile service.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("not allowed")]
    Forbidden,
    #[error("consultant not found")]
    NotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { users, profiles }
    }

    /// Applies a partial update on behalf of the owner or an admin. Fields
    /// absent from the patch keep their stored value.
    pub fn update(
        &self,
        caller: &Identity,
        target: &UserId,
        patch: &ProfilePatch,
    ) -> Result<ConsultantProfile, ProfileError> {
        let allowed = caller.id == *target || caller.role == UserRole::Admin;
        if !allowed {
            return Err(ProfileError::Forbidden);
        }

        let mut profile = self
            .profiles
            .fetch(target)?
            .ok_or(ProfileError::NotFound)?;

        patch.apply_to(&mut profile);
        profile.updated_at = Utc::now();

        Ok(self.profiles.update(profile)?)
    }

    /// Flips the verification flag. Admin only; this is the sole write path
    /// for `verified`.
    pub fn set_verified(
        &self,
        caller: &Identity,
        target: &UserId,
        verified: bool,
    ) -> Result<ConsultantProfile, ProfileError> {
        if caller.role != UserRole::Admin {
            return Err(ProfileError::Forbidden);
        }

        let mut profile = self
            .profiles
            .fetch(target)?
            .ok_or(ProfileError::NotFound)?;

        profile.verified = verified;
        profile.updated_at = Utc::now();

        Ok(self.profiles.update(profile)?)
    }

    /// Fetches one consultant with their account identity. `viewer` is `None`
    /// for anonymous callers; an unverified profile is indistinguishable from
    /// an absent one unless the viewer is the owner or an admin.
    pub fn get(
        &self,
        target: &UserId,
        viewer: Option<&Identity>,
    ) -> Result<ConsultantListing, ProfileError> {
        let account = self
            .users
            .fetch(target)?
            .filter(|account| account.role == UserRole::Consultant)
            .ok_or(ProfileError::NotFound)?;

        let profile = self
            .profiles
            .fetch(target)?
            .ok_or(ProfileError::NotFound)?;

        let privileged = viewer.is_some_and(|identity| {
            identity.id == *target || identity.role == UserRole::Admin
        });

        if !profile.verified && !privileged {
            return Err(ProfileError::NotFound);
        }

        Ok(ConsultantListing {
            id: account.id,
            name: account.name,
            email: account.email,
            profile,
        })
    }

    /// All verified consultants joined with their account identity, in the
    /// order the store returns them. Input to the directory filter.
    pub fn verified_listings(&self) -> Result<Vec<ConsultantListing>, ProfileError> {
        let mut listings = Vec::new();
        for profile in self.profiles.verified()? {
            // A profile without its account row would be a broken invariant;
            // skip it rather than failing the whole directory.
            if let Some(account) = self.users.fetch(&profile.user_id)? {
                listings.push(ConsultantListing {
                    id: account.id,
                    name: account.name,
                    email: account.email,
                    profile,
                });
            }
        }
        Ok(listings)
    }
}
