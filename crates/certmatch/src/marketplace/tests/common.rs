use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::marketplace::domain::{
    ConsultantProfile, CreateInquiry, Inquiry, InquiryId, InquiryStatus, UserAccount, UserId,
    UserRole,
};
use crate::marketplace::identity::{
    AuthDirectory, AuthError, Identity, IdentityProvider, IdentityResolver, ProvisionedCredential,
    RequestCredentials,
};
use crate::marketplace::inquiries::InquiryService;
use crate::marketplace::profiles::ProfileService;
use crate::marketplace::repository::{
    EventError, EventPublisher, InquiryRepository, MarketplaceEvent, ProfileRepository,
    RepositoryError, UserRepository,
};
use crate::marketplace::router::MarketplaceState;
use crate::marketplace::signup::{SignupRequest, SignupService};

/// Auth directory double that also plays the identity provider: it issues
/// bearer tokens on demand and remembers provisioned ids so compensation can
/// be asserted.
#[derive(Default)]
pub(super) struct MemoryAuth {
    sequence: AtomicU64,
    tokens: Mutex<HashMap<String, UserId>>,
    provisioned: Mutex<Vec<UserId>>,
}

impl MemoryAuth {
    pub(super) fn issue_token(&self, user_id: &UserId) -> String {
        let token = format!("tok-{}", user_id.0);
        self.tokens
            .lock()
            .expect("token mutex poisoned")
            .insert(token.clone(), user_id.clone());
        token
    }

    pub(super) fn provisioned(&self) -> Vec<UserId> {
        self.provisioned
            .lock()
            .expect("provision mutex poisoned")
            .clone()
    }
}

impl AuthDirectory for MemoryAuth {
    fn provision(&self, email: &str, _password: &str) -> Result<ProvisionedCredential, AuthError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let user_id = UserId(format!("usr-{id:06}"));
        self.provisioned
            .lock()
            .expect("provision mutex poisoned")
            .push(user_id.clone());
        Ok(ProvisionedCredential {
            user_id,
            credential_hash: format!("hash:{email}"),
        })
    }

    fn remove(&self, user_id: &UserId) -> Result<(), AuthError> {
        self.provisioned
            .lock()
            .expect("provision mutex poisoned")
            .retain(|id| id != user_id);
        Ok(())
    }
}

impl IdentityProvider for MemoryAuth {
    fn authenticate(&self, credentials: &RequestCredentials) -> Result<UserId, AuthError> {
        let bearer = credentials
            .bearer
            .as_deref()
            .ok_or(AuthError::Unauthenticated)?;
        self.tokens
            .lock()
            .expect("token mutex poisoned")
            .get(bearer)
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

#[derive(Default)]
pub(super) struct MemoryUsers {
    rows: Mutex<HashMap<UserId, UserAccount>>,
}

impl UserRepository for MemoryUsers {
    fn insert(&self, account: UserAccount) -> Result<UserAccount, RepositoryError> {
        let mut rows = self.rows.lock().expect("user mutex poisoned");
        if rows.contains_key(&account.id) || rows.values().any(|a| a.email == account.email) {
            return Err(RepositoryError::Conflict);
        }
        rows.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    fn delete(&self, id: &UserId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().expect("user mutex poisoned");
        rows.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError> {
        let rows = self.rows.lock().expect("user mutex poisoned");
        Ok(rows.get(id).cloned())
    }

    fn fetch_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError> {
        let rows = self.rows.lock().expect("user mutex poisoned");
        Ok(rows.values().find(|a| a.email == email).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryProfiles {
    rows: Mutex<HashMap<UserId, ConsultantProfile>>,
}

impl MemoryProfiles {
    pub(super) fn stored(&self, user_id: &UserId) -> Option<ConsultantProfile> {
        self.rows
            .lock()
            .expect("profile mutex poisoned")
            .get(user_id)
            .cloned()
    }
}

impl ProfileRepository for MemoryProfiles {
    fn insert(&self, profile: ConsultantProfile) -> Result<ConsultantProfile, RepositoryError> {
        let mut rows = self.rows.lock().expect("profile mutex poisoned");
        if rows.contains_key(&profile.user_id) {
            return Err(RepositoryError::Conflict);
        }
        rows.insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }

    fn update(&self, profile: ConsultantProfile) -> Result<ConsultantProfile, RepositoryError> {
        let mut rows = self.rows.lock().expect("profile mutex poisoned");
        if !rows.contains_key(&profile.user_id) {
            return Err(RepositoryError::NotFound);
        }
        rows.insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }

    fn fetch(&self, user_id: &UserId) -> Result<Option<ConsultantProfile>, RepositoryError> {
        let rows = self.rows.lock().expect("profile mutex poisoned");
        Ok(rows.get(user_id).cloned())
    }

    fn verified(&self) -> Result<Vec<ConsultantProfile>, RepositoryError> {
        let rows = self.rows.lock().expect("profile mutex poisoned");
        let mut verified: Vec<_> = rows.values().filter(|p| p.verified).cloned().collect();
        verified.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(verified)
    }
}

/// Profile store that refuses inserts, for exercising saga compensation.
#[derive(Default)]
pub(super) struct RejectingProfiles;

impl ProfileRepository for RejectingProfiles {
    fn insert(&self, _profile: ConsultantProfile) -> Result<ConsultantProfile, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }

    fn update(&self, _profile: ConsultantProfile) -> Result<ConsultantProfile, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }

    fn fetch(&self, _user_id: &UserId) -> Result<Option<ConsultantProfile>, RepositoryError> {
        Ok(None)
    }

    fn verified(&self) -> Result<Vec<ConsultantProfile>, RepositoryError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub(super) struct MemoryInquiries {
    rows: Mutex<HashMap<InquiryId, Inquiry>>,
}

impl MemoryInquiries {
    pub(super) fn stored(&self, id: &InquiryId) -> Option<Inquiry> {
        self.rows
            .lock()
            .expect("inquiry mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl InquiryRepository for MemoryInquiries {
    fn insert(&self, inquiry: Inquiry) -> Result<Inquiry, RepositoryError> {
        let mut rows = self.rows.lock().expect("inquiry mutex poisoned");
        if rows.contains_key(&inquiry.id) {
            return Err(RepositoryError::Conflict);
        }
        rows.insert(inquiry.id.clone(), inquiry.clone());
        Ok(inquiry)
    }

    fn fetch(&self, id: &InquiryId) -> Result<Option<Inquiry>, RepositoryError> {
        let rows = self.rows.lock().expect("inquiry mutex poisoned");
        Ok(rows.get(id).cloned())
    }

    fn update_status(
        &self,
        id: &InquiryId,
        expected: InquiryStatus,
        next: InquiryStatus,
        at: DateTime<Utc>,
    ) -> Result<Inquiry, RepositoryError> {
        let mut rows = self.rows.lock().expect("inquiry mutex poisoned");
        let inquiry = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if inquiry.status != expected {
            return Err(RepositoryError::Conflict);
        }
        inquiry.status = next;
        inquiry.updated_at = at;
        Ok(inquiry.clone())
    }

    fn list_all(&self) -> Result<Vec<Inquiry>, RepositoryError> {
        let rows = self.rows.lock().expect("inquiry mutex poisoned");
        Ok(rows.values().cloned().collect())
    }

    fn list_for_company(&self, company_id: &UserId) -> Result<Vec<Inquiry>, RepositoryError> {
        let rows = self.rows.lock().expect("inquiry mutex poisoned");
        Ok(rows
            .values()
            .filter(|i| i.company_id == *company_id)
            .cloned()
            .collect())
    }

    fn list_for_consultant(&self, consultant_id: &UserId) -> Result<Vec<Inquiry>, RepositoryError> {
        let rows = self.rows.lock().expect("inquiry mutex poisoned");
        Ok(rows
            .values()
            .filter(|i| i.consultant_id == *consultant_id)
            .cloned()
            .collect())
    }
}

/// Inquiry store that is permanently offline.
pub(super) struct UnavailableInquiries;

impl InquiryRepository for UnavailableInquiries {
    fn insert(&self, _inquiry: Inquiry) -> Result<Inquiry, RepositoryError> {
        Err(RepositoryError::Unavailable("inquiry store offline".to_string()))
    }

    fn fetch(&self, _id: &InquiryId) -> Result<Option<Inquiry>, RepositoryError> {
        Err(RepositoryError::Unavailable("inquiry store offline".to_string()))
    }

    fn update_status(
        &self,
        _id: &InquiryId,
        _expected: InquiryStatus,
        _next: InquiryStatus,
        _at: DateTime<Utc>,
    ) -> Result<Inquiry, RepositoryError> {
        Err(RepositoryError::Unavailable("inquiry store offline".to_string()))
    }

    fn list_all(&self) -> Result<Vec<Inquiry>, RepositoryError> {
        Err(RepositoryError::Unavailable("inquiry store offline".to_string()))
    }

    fn list_for_company(&self, _company_id: &UserId) -> Result<Vec<Inquiry>, RepositoryError> {
        Err(RepositoryError::Unavailable("inquiry store offline".to_string()))
    }

    fn list_for_consultant(&self, _consultant_id: &UserId) -> Result<Vec<Inquiry>, RepositoryError> {
        Err(RepositoryError::Unavailable("inquiry store offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryEvents {
    events: Mutex<Vec<MarketplaceEvent>>,
}

impl MemoryEvents {
    pub(super) fn events(&self) -> Vec<MarketplaceEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl EventPublisher for MemoryEvents {
    fn publish(&self, event: MarketplaceEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}

/// Fully wired state plus handles on every double so tests can reach behind
/// the services.
pub(super) struct Harness {
    pub(super) state: Arc<MarketplaceState>,
    pub(super) auth: Arc<MemoryAuth>,
    pub(super) users: Arc<MemoryUsers>,
    pub(super) profiles: Arc<MemoryProfiles>,
    pub(super) inquiries: Arc<MemoryInquiries>,
    pub(super) events: Arc<MemoryEvents>,
}

pub(super) fn harness() -> Harness {
    let auth = Arc::new(MemoryAuth::default());
    let users = Arc::new(MemoryUsers::default());
    let profiles = Arc::new(MemoryProfiles::default());
    let inquiries = Arc::new(MemoryInquiries::default());
    let events = Arc::new(MemoryEvents::default());

    let state = Arc::new(MarketplaceState {
        resolver: IdentityResolver::new(auth.clone(), users.clone()),
        signup: SignupService::new(auth.clone(), users.clone(), profiles.clone()),
        profiles: ProfileService::new(users.clone(), profiles.clone()),
        inquiries: InquiryService::new(users.clone(), inquiries.clone(), events.clone()),
    });

    Harness {
        state,
        auth,
        users,
        profiles,
        inquiries,
        events,
    }
}

pub(super) fn signup(harness: &Harness, name: &str, email: &str, role: &str) -> UserAccount {
    harness
        .state
        .signup
        .signup(SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: "swordfish".to_string(),
            role: role.to_string(),
            headline: None,
            bio: None,
        })
        .expect("signup succeeds")
}

pub(super) fn identity(account: &UserAccount) -> Identity {
    Identity {
        id: account.id.clone(),
        role: account.role,
    }
}

pub(super) fn admin_identity() -> Identity {
    Identity {
        id: UserId("usr-admin".to_string()),
        role: UserRole::Admin,
    }
}

pub(super) fn inquiry_request(consultant: &UserAccount, message: &str, mode: &str) -> CreateInquiry {
    CreateInquiry {
        consultant_id: consultant.id.clone(),
        message: message.to_string(),
        timing: Some("next quarter".to_string()),
        mode: mode.to_string(),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
