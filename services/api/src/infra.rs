use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use certmatch::marketplace::{
    AuthDirectory, AuthError, ConsultantProfile, EventError, EventPublisher, IdentityProvider,
    IdentityResolver, Inquiry, InquiryId, InquiryRepository, InquiryService, InquiryStatus,
    MarketplaceEvent, MarketplaceState, ProfileRepository, ProfileService, ProvisionedCredential,
    RepositoryError, RequestCredentials, SignupService, UserAccount, UserId, UserRepository,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-process stand-in for the managed auth subsystem: provisions opaque
/// credentials and validates bearer tokens it issued itself.
#[derive(Default)]
pub(crate) struct InMemoryAuthService {
    sequence: AtomicU64,
    tokens: Mutex<HashMap<String, UserId>>,
}

impl InMemoryAuthService {
    /// Hands out a bearer token for an already-provisioned account. The demo
    /// command uses this in place of a login flow.
    pub(crate) fn issue_token(&self, user_id: &UserId) -> String {
        let token = format!("tok-{}", user_id.0);
        self.tokens
            .lock()
            .expect("token mutex poisoned")
            .insert(token.clone(), user_id.clone());
        token
    }
}

impl AuthDirectory for InMemoryAuthService {
    fn provision(&self, email: &str, _password: &str) -> Result<ProvisionedCredential, AuthError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(ProvisionedCredential {
            user_id: UserId(format!("usr-{id:06}")),
            credential_hash: format!("managed:{email}"),
        })
    }

    fn remove(&self, user_id: &UserId) -> Result<(), AuthError> {
        let mut tokens = self.tokens.lock().expect("token mutex poisoned");
        tokens.retain(|_, id| id != user_id);
        Ok(())
    }
}

impl IdentityProvider for InMemoryAuthService {
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
pub(crate) struct InMemoryUserRepository {
    rows: Mutex<HashMap<UserId, UserAccount>>,
}

impl UserRepository for InMemoryUserRepository {
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
pub(crate) struct InMemoryProfileRepository {
    rows: Mutex<HashMap<UserId, ConsultantProfile>>,
}

impl ProfileRepository for InMemoryProfileRepository {
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

#[derive(Default)]
pub(crate) struct InMemoryInquiryRepository {
    rows: Mutex<HashMap<InquiryId, Inquiry>>,
}

impl InquiryRepository for InMemoryInquiryRepository {
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

/// Records lifecycle events and logs them. The admin notification channel is
/// not wired up; this keeps the hook observable in the meantime.
#[derive(Default)]
pub(crate) struct InMemoryEventPublisher {
    events: Mutex<Vec<MarketplaceEvent>>,
}

impl InMemoryEventPublisher {
    pub(crate) fn events(&self) -> Vec<MarketplaceEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl EventPublisher for InMemoryEventPublisher {
    fn publish(&self, event: MarketplaceEvent) -> Result<(), EventError> {
        info!(?event, "marketplace event");
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}

/// Fully wired in-memory marketplace plus handles the demo and server need.
pub(crate) struct MarketplaceInfra {
    pub(crate) state: Arc<MarketplaceState>,
    pub(crate) auth: Arc<InMemoryAuthService>,
    pub(crate) events: Arc<InMemoryEventPublisher>,
}

pub(crate) fn build_marketplace() -> MarketplaceInfra {
    let auth = Arc::new(InMemoryAuthService::default());
    let users = Arc::new(InMemoryUserRepository::default());
    let profiles = Arc::new(InMemoryProfileRepository::default());
    let inquiries = Arc::new(InMemoryInquiryRepository::default());
    let events = Arc::new(InMemoryEventPublisher::default());

    let state = Arc::new(MarketplaceState {
        resolver: IdentityResolver::new(auth.clone(), users.clone()),
        signup: SignupService::new(auth.clone(), users.clone(), profiles.clone()),
        profiles: ProfileService::new(users.clone(), profiles.clone()),
        inquiries: InquiryService::new(users, inquiries, events.clone()),
    });

    MarketplaceInfra {
        state,
        auth,
        events,
    }
}
