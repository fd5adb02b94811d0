use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::domain::{
    CreateInquiry, EngagementMode, Inquiry, InquiryId, InquiryStatus, InquiryView, PartyView,
    UserAccount, UserId, UserRole,
};
use super::identity::Identity;
use super::lifecycle::{check_transition, InquiryActor, TransitionDenied};
use super::repository::{
    EventPublisher, InquiryRepository, MarketplaceEvent, RepositoryError, UserRepository,
};

static INQUIRY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_inquiry_id() -> InquiryId {
    let id = INQUIRY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InquiryId(format!("inq-{id:06}"))
}

/// Service owning inquiry intake, the status state machine, and role-scoped
/// listings.
pub struct InquiryService {
    users: Arc<dyn UserRepository>,
    inquiries: Arc<dyn InquiryRepository>,
    events: Arc<dyn EventPublisher>,
}

/// Error raised by the inquiry service.
#[derive(Debug, thiserror::Error)]
pub enum InquiryError {
    #[error("not allowed")]
    Forbidden,
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("invalid mode '{0}'")]
    InvalidMode(String),
    #[error("invalid status '{0}'")]
    InvalidStatus(String),
    #[error("cannot change status from {} to {}", from.label(), to.label())]
    IllegalTransition {
        from: InquiryStatus,
        to: InquiryStatus,
    },
    #[error("consultant not found")]
    ConsultantNotFound,
    #[error("inquiry not found")]
    NotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl InquiryService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        inquiries: Arc<dyn InquiryRepository>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            users,
            inquiries,
            events,
        }
    }

    /// Creates an inquiry from the calling company to a consultant. The
    /// consultant does not have to be verified: admins may broker contact to
    /// consultants who are still pending review.
    pub fn create(
        &self,
        caller: &Identity,
        request: CreateInquiry,
    ) -> Result<Inquiry, InquiryError> {
        if caller.role != UserRole::Company {
            return Err(InquiryError::Forbidden);
        }

        if request.message.trim().is_empty() {
            return Err(InquiryError::EmptyMessage);
        }

        let mode = EngagementMode::parse(&request.mode)
            .ok_or_else(|| InquiryError::InvalidMode(request.mode.clone()))?;

        let consultant = self.users.fetch(&request.consultant_id)?;
        if !consultant.is_some_and(|account| account.role == UserRole::Consultant) {
            return Err(InquiryError::ConsultantNotFound);
        }

        let now = Utc::now();
        let inquiry = Inquiry {
            id: next_inquiry_id(),
            company_id: caller.id.clone(),
            consultant_id: request.consultant_id,
            message: request.message,
            timing: request.timing,
            mode,
            status: InquiryStatus::Sent,
            created_at: now,
            updated_at: now,
        };

        Ok(self.inquiries.insert(inquiry)?)
    }

    /// Drives one edge of the status state machine on behalf of the caller.
    ///
    /// `requested` arrives as free text; only `accepted`, `declined`, and
    /// `closed` are valid targets — an inquiry can never return to `sent`.
    pub fn transition(
        &self,
        caller: &Identity,
        id: &InquiryId,
        requested: &str,
    ) -> Result<Inquiry, InquiryError> {
        let target = InquiryStatus::parse(requested)
            .filter(|status| *status != InquiryStatus::Sent)
            .ok_or_else(|| InquiryError::InvalidStatus(requested.to_string()))?;

        let inquiry = self.inquiries.fetch(id)?.ok_or(InquiryError::NotFound)?;

        let actor = InquiryActor::resolve(caller, &inquiry);
        check_transition(actor, inquiry.status, target).map_err(|denied| match denied {
            TransitionDenied::Forbidden => InquiryError::Forbidden,
            TransitionDenied::IllegalTransition { from, to } => {
                InquiryError::IllegalTransition { from, to }
            }
        })?;

        let updated = self
            .inquiries
            .update_status(id, inquiry.status, target, Utc::now())
            .map_err(|err| match err {
                // Lost a race: the record is no longer where we checked it.
                RepositoryError::Conflict => InquiryError::IllegalTransition {
                    from: inquiry.status,
                    to: target,
                },
                RepositoryError::NotFound => InquiryError::NotFound,
                other => InquiryError::Repository(other),
            })?;

        if updated.status == InquiryStatus::Accepted {
            let event = MarketplaceEvent::InquiryAccepted {
                inquiry_id: updated.id.clone(),
                company_id: updated.company_id.clone(),
                consultant_id: updated.consultant_id.clone(),
            };
            // Delivery is a hook, not a guarantee; the transition stands
            // even when the transport is down.
            if let Err(err) = self.events.publish(event) {
                warn!(inquiry = %updated.id.0, "failed to publish acceptance event: {err}");
            }
        }

        Ok(updated)
    }

    /// Lists inquiries visible to the caller, newest first. Companies see
    /// what they sent, consultants what they received, admins everything.
    pub fn list(&self, caller: &Identity) -> Result<Vec<InquiryView>, InquiryError> {
        let mut inquiries = match caller.role {
            UserRole::Company => self.inquiries.list_for_company(&caller.id)?,
            UserRole::Consultant => self.inquiries.list_for_consultant(&caller.id)?,
            UserRole::Admin => self.inquiries.list_all()?,
        };

        // Newest first; the id sequence breaks created_at ties so the order
        // is stable under fast successive creations.
        inquiries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        inquiries
            .into_iter()
            .map(|inquiry| self.view(inquiry))
            .collect()
    }

    fn view(&self, inquiry: Inquiry) -> Result<InquiryView, InquiryError> {
        let company = self.party(&inquiry.company_id)?;
        let consultant = self.party(&inquiry.consultant_id)?;

        Ok(InquiryView {
            id: inquiry.id,
            company,
            consultant,
            message: inquiry.message,
            timing: inquiry.timing,
            mode: inquiry.mode,
            status: inquiry.status,
            created_at: inquiry.created_at,
            updated_at: inquiry.updated_at,
        })
    }

    fn party(&self, id: &UserId) -> Result<PartyView, InquiryError> {
        let account = self.users.fetch(id)?;
        Ok(match account {
            Some(UserAccount { id, name, email, .. }) => PartyView { id, name, email },
            // Accounts are never deleted in-band, but a dangling reference
            // should not take the whole listing down.
            None => PartyView {
                id: id.clone(),
                name: String::new(),
                email: String::new(),
            },
        })
    }
}
