use clap::Args;

use certmatch::error::AppError;
use certmatch::marketplace::{
    directory, ConsultantListing, CreateInquiry, DirectoryQuery, Identity, InquiryView,
    ProfilePatch, SignupRequest, UserAccount,
};

use crate::infra::{build_marketplace, MarketplaceInfra};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the inquiry lifecycle portion of the demo.
    #[arg(long)]
    pub(crate) skip_inquiries: bool,
}

/// Seeds an in-memory marketplace and narrates one complete pass through it:
/// signup, profile curation, admin verification, directory lookups, and the
/// inquiry lifecycle.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let infra = build_marketplace();

    println!("=== Accounts ===");
    let admin = signup(&infra, "Jo Admin", "jo@certmatch.test", "admin", None);
    let company = signup(&infra, "Acme Gmbh", "ops@acme.test", "company", None);
    let consultant = signup(
        &infra,
        "Dana Berg",
        "dana@consult.test",
        "consultant",
        Some("ISO 9001 lead auditor"),
    );
    let pending = signup(
        &infra,
        "Femi Ade",
        "femi@consult.test",
        "consultant",
        Some("Information security programs"),
    );

    let admin_id = identity(&admin);
    let company_id = identity(&company);
    let consultant_id = identity(&consultant);

    println!("\n=== Profile curation ===");
    let patch = ProfilePatch {
        bio: Some("Fifteen years of QMS rollouts across manufacturing.".to_string()),
        standards: Some(vec!["ISO 9001".to_string(), "ISO 14001".to_string()]),
        industries: Some(vec!["Manufacturing".to_string()]),
        regions: Some(vec!["DACH".to_string()]),
        ..ProfilePatch::default()
    };
    infra
        .state
        .profiles
        .update(&consultant_id, &consultant.id, &patch)
        .map_err(demo_failure)?;
    println!("{} updated their profile", consultant.name);

    println!("\n=== Verification ===");
    infra
        .state
        .profiles
        .set_verified(&admin_id, &consultant.id, true)
        .map_err(demo_failure)?;
    println!("{} verified {}", admin.name, consultant.name);
    println!("{} remains unverified and hidden", pending.name);

    println!("\n=== Directory ===");
    let listings = infra
        .state
        .profiles
        .verified_listings()
        .map_err(demo_failure)?;
    render_directory("all consultants", directory::filter(&listings, &DirectoryQuery::default()));
    let query = DirectoryQuery {
        standard: Some("ISO 9001".to_string()),
        ..DirectoryQuery::default()
    };
    render_directory("standard = ISO 9001", directory::filter(&listings, &query));

    if args.skip_inquiries {
        return Ok(());
    }

    println!("\n=== Inquiry lifecycle ===");
    let inquiry = infra
        .state
        .inquiries
        .create(
            &company_id,
            CreateInquiry {
                consultant_id: consultant.id.clone(),
                message: "Need ISO 9001 help for our Hamburg plant".to_string(),
                timing: Some("next quarter".to_string()),
                mode: "remote".to_string(),
            },
        )
        .map_err(demo_failure)?;
    println!(
        "{} -> {}: '{}' [{}]",
        company.name,
        consultant.name,
        inquiry.message,
        inquiry.status.label()
    );

    let accepted = infra
        .state
        .inquiries
        .transition(&consultant_id, &inquiry.id, "accepted")
        .map_err(demo_failure)?;
    println!("{} accepted -> [{}]", consultant.name, accepted.status.label());

    let closed = infra
        .state
        .inquiries
        .transition(&company_id, &inquiry.id, "closed")
        .map_err(demo_failure)?;
    println!("{} closed -> [{}]", company.name, closed.status.label());

    match infra
        .state
        .inquiries
        .transition(&consultant_id, &inquiry.id, "accepted")
    {
        Ok(_) => println!("unexpected: terminal inquiry moved"),
        Err(err) => println!("reopening rejected: {err}"),
    }

    println!("\n=== Inbox views ===");
    render_inbox(
        &company.name,
        infra
            .state
            .inquiries
            .list(&company_id)
            .map_err(demo_failure)?,
    );
    render_inbox(
        &admin.name,
        infra.state.inquiries.list(&admin_id).map_err(demo_failure)?,
    );

    println!("\n=== Emitted events ===");
    for event in infra.events.events() {
        println!("{event:?}");
    }

    Ok(())
}

fn signup(
    infra: &MarketplaceInfra,
    name: &str,
    email: &str,
    role: &str,
    headline: Option<&str>,
) -> UserAccount {
    let account = infra
        .state
        .signup
        .signup(SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: "demo-password".to_string(),
            role: role.to_string(),
            headline: headline.map(str::to_string),
            bio: None,
        })
        .expect("demo signup succeeds");
    // Matching what a login flow would do for a real session.
    infra.auth.issue_token(&account.id);
    println!("signed up {} as {}", account.name, account.role.label());
    account
}

fn identity(account: &UserAccount) -> Identity {
    Identity {
        id: account.id.clone(),
        role: account.role,
    }
}

fn render_directory(label: &str, matches: Vec<&ConsultantListing>) {
    println!("[{label}] {} match(es)", matches.len());
    for listing in matches {
        println!(
            "  {} — {} ({})",
            listing.name,
            listing.profile.headline.as_deref().unwrap_or("no headline"),
            listing.profile.standards.join(", ")
        );
    }
}

fn render_inbox(owner: &str, views: Vec<InquiryView>) {
    println!("{owner} sees {} inquiry(ies)", views.len());
    for view in views {
        println!(
            "  {} -> {} [{}] {}",
            view.company.name,
            view.consultant.name,
            view.status.label(),
            view.message
        );
    }
}

fn demo_failure(err: impl std::fmt::Display) -> AppError {
    AppError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        err.to_string(),
    ))
}
