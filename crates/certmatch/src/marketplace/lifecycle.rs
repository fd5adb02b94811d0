//! Inquiry lifecycle rules: which status changes are legal and which actor
//! may request them.
//!
//! The table below is the single source of truth; nothing else in the crate
//! branches on status pairs. Permission and legality are evaluated as two
//! independent checks, permission first, so an outsider probing a record
//! learns nothing about its current state.

use super::domain::{Inquiry, InquiryStatus, UserRole};
use super::identity::Identity;

/// The caller's relationship to one specific inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InquiryActor {
    OwningCompany,
    OwningConsultant,
    Admin,
    Stranger,
}

impl InquiryActor {
    pub fn resolve(identity: &Identity, inquiry: &Inquiry) -> Self {
        match identity.role {
            UserRole::Admin => InquiryActor::Admin,
            UserRole::Company if inquiry.company_id == identity.id => InquiryActor::OwningCompany,
            UserRole::Consultant if inquiry.consultant_id == identity.id => {
                InquiryActor::OwningConsultant
            }
            _ => InquiryActor::Stranger,
        }
    }
}

/// One legal edge of the state machine. Admin is allowed on every edge.
struct TransitionRule {
    from: InquiryStatus,
    to: InquiryStatus,
    company: bool,
    consultant: bool,
}

const TRANSITION_TABLE: &[TransitionRule] = &[
    TransitionRule {
        from: InquiryStatus::Sent,
        to: InquiryStatus::Accepted,
        company: false,
        consultant: true,
    },
    TransitionRule {
        from: InquiryStatus::Sent,
        to: InquiryStatus::Declined,
        company: false,
        consultant: true,
    },
    TransitionRule {
        from: InquiryStatus::Sent,
        to: InquiryStatus::Closed,
        company: true,
        consultant: true,
    },
    TransitionRule {
        from: InquiryStatus::Accepted,
        to: InquiryStatus::Closed,
        company: true,
        consultant: true,
    },
];

/// Outcome of a denied transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDenied {
    /// The actor may not touch this inquiry, or may not drive this edge.
    Forbidden,
    /// The status pair is not an edge of the state machine.
    IllegalTransition {
        from: InquiryStatus,
        to: InquiryStatus,
    },
}

/// Checks whether `actor` may move an inquiry from `from` to `to`.
///
/// Strangers are rejected before the table is consulted: they must receive
/// the same answer whether or not the transition would have been legal.
pub fn check_transition(
    actor: InquiryActor,
    from: InquiryStatus,
    to: InquiryStatus,
) -> Result<(), TransitionDenied> {
    if actor == InquiryActor::Stranger {
        return Err(TransitionDenied::Forbidden);
    }

    let rule = TRANSITION_TABLE
        .iter()
        .find(|rule| rule.from == from && rule.to == to)
        .ok_or(TransitionDenied::IllegalTransition { from, to })?;

    let allowed = match actor {
        InquiryActor::Admin => true,
        InquiryActor::OwningCompany => rule.company,
        InquiryActor::OwningConsultant => rule.consultant,
        InquiryActor::Stranger => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(TransitionDenied::Forbidden)
    }
}
