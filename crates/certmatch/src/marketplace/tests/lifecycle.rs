use crate::marketplace::domain::InquiryStatus::{Accepted, Closed, Declined, Sent};
use crate::marketplace::lifecycle::{check_transition, InquiryActor, TransitionDenied};

#[test]
fn consultant_accepts_and_declines_sent_inquiries() {
    assert!(check_transition(InquiryActor::OwningConsultant, Sent, Accepted).is_ok());
    assert!(check_transition(InquiryActor::OwningConsultant, Sent, Declined).is_ok());
}

#[test]
fn company_cannot_accept_or_decline() {
    assert_eq!(
        check_transition(InquiryActor::OwningCompany, Sent, Accepted),
        Err(TransitionDenied::Forbidden)
    );
    assert_eq!(
        check_transition(InquiryActor::OwningCompany, Sent, Declined),
        Err(TransitionDenied::Forbidden)
    );
}

#[test]
fn both_parties_close_from_sent_and_accepted() {
    for actor in [InquiryActor::OwningCompany, InquiryActor::OwningConsultant] {
        assert!(check_transition(actor, Sent, Closed).is_ok());
        assert!(check_transition(actor, Accepted, Closed).is_ok());
    }
}

#[test]
fn admin_may_drive_every_edge() {
    for (from, to) in [(Sent, Accepted), (Sent, Declined), (Sent, Closed), (Accepted, Closed)] {
        assert!(check_transition(InquiryActor::Admin, from, to).is_ok());
    }
}

#[test]
fn terminal_states_admit_no_exit() {
    for from in [Declined, Closed] {
        for to in [Sent, Accepted, Declined, Closed] {
            assert_eq!(
                check_transition(InquiryActor::Admin, from, to),
                Err(TransitionDenied::IllegalTransition { from, to }),
                "{} -> {} must be illegal",
                from.label(),
                to.label()
            );
        }
    }
}

#[test]
fn accepted_cannot_be_declined() {
    assert_eq!(
        check_transition(InquiryActor::OwningConsultant, Accepted, Declined),
        Err(TransitionDenied::IllegalTransition {
            from: Accepted,
            to: Declined
        })
    );
}

#[test]
fn nothing_returns_to_sent() {
    for from in [Sent, Accepted] {
        assert_eq!(
            check_transition(InquiryActor::Admin, from, Sent),
            Err(TransitionDenied::IllegalTransition { from, to: Sent })
        );
    }
}

/// `is_terminal` and the transition table must agree on which states have
/// outgoing edges.
#[test]
fn terminal_flags_match_the_table() {
    for status in [Sent, Accepted, Declined, Closed] {
        let has_exit = [Sent, Accepted, Declined, Closed]
            .into_iter()
            .any(|to| check_transition(InquiryActor::Admin, status, to).is_ok());
        assert_eq!(status.is_terminal(), !has_exit, "{}", status.label());
    }
}

/// A stranger gets the same answer whether the requested edge exists or not,
/// so probing transition responses reveals nothing about the record.
#[test]
fn stranger_is_forbidden_regardless_of_edge_legality() {
    assert_eq!(
        check_transition(InquiryActor::Stranger, Sent, Accepted),
        Err(TransitionDenied::Forbidden)
    );
    assert_eq!(
        check_transition(InquiryActor::Stranger, Closed, Accepted),
        Err(TransitionDenied::Forbidden)
    );
    assert_eq!(
        check_transition(InquiryActor::Stranger, Declined, Sent),
        Err(TransitionDenied::Forbidden)
    );
}
