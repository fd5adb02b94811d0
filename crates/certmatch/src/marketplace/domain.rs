use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for user accounts across all three roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for consulting inquiries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InquiryId(pub String);

/// Closed set of account roles. A role never changes after signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Company,
    Consultant,
    Admin,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Company => "company",
            UserRole::Consultant => "consultant",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "company" => Some(UserRole::Company),
            "consultant" => Some(UserRole::Consultant),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Account record backing every marketplace participant.
///
/// `credential_hash` is opaque: it is produced by the external auth directory
/// and stored verbatim, never inspected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub role: UserRole,
    pub name: String,
    pub email: String,
    pub credential_hash: String,
    pub created_at: DateTime<Utc>,
}

/// One-to-one companion record for accounts with [`UserRole::Consultant`].
///
/// The set-valued fields are stored as vectors but treated as sets: order is
/// irrelevant and membership is what the directory filter matches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultantProfile {
    pub user_id: UserId,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub standards: Vec<String>,
    pub industries: Vec<String>,
    pub certifications: Vec<String>,
    pub regions: Vec<String>,
    pub languages: Vec<String>,
    pub availability: Option<String>,
    pub profile_picture_url: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConsultantProfile {
    /// Fresh profile created during consultant signup. Unverified until an
    /// admin says otherwise.
    pub fn new(user_id: UserId, headline: Option<String>, bio: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            headline,
            bio,
            standards: Vec::new(),
            industries: Vec::new(),
            certifications: Vec::new(),
            regions: Vec::new(),
            languages: Vec::new(),
            availability: None,
            profile_picture_url: None,
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a consultant profile. Fields left as `None` keep their
/// stored value; the `verified` flag deliberately has no slot here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub standards: Option<Vec<String>>,
    #[serde(default)]
    pub industries: Option<Vec<String>>,
    #[serde(default)]
    pub certifications: Option<Vec<String>>,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

impl ProfilePatch {
    pub fn apply_to(&self, profile: &mut ConsultantProfile) {
        if let Some(headline) = &self.headline {
            profile.headline = Some(headline.clone());
        }
        if let Some(bio) = &self.bio {
            profile.bio = Some(bio.clone());
        }
        if let Some(standards) = &self.standards {
            profile.standards = standards.clone();
        }
        if let Some(industries) = &self.industries {
            profile.industries = industries.clone();
        }
        if let Some(certifications) = &self.certifications {
            profile.certifications = certifications.clone();
        }
        if let Some(regions) = &self.regions {
            profile.regions = regions.clone();
        }
        if let Some(languages) = &self.languages {
            profile.languages = languages.clone();
        }
        if let Some(availability) = &self.availability {
            profile.availability = Some(availability.clone());
        }
        if let Some(url) = &self.profile_picture_url {
            profile.profile_picture_url = Some(url.clone());
        }
    }
}

/// Delivery modality requested for a consulting engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementMode {
    Remote,
    Hybrid,
    Onsite,
}

impl EngagementMode {
    pub const fn label(self) -> &'static str {
        match self {
            EngagementMode::Remote => "remote",
            EngagementMode::Hybrid => "hybrid",
            EngagementMode::Onsite => "onsite",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" => Some(EngagementMode::Remote),
            "hybrid" => Some(EngagementMode::Hybrid),
            "onsite" => Some(EngagementMode::Onsite),
            _ => None,
        }
    }
}

/// Lifecycle status of an inquiry. `Declined` and `Closed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    Sent,
    Accepted,
    Declined,
    Closed,
}

impl InquiryStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InquiryStatus::Sent => "sent",
            InquiryStatus::Accepted => "accepted",
            InquiryStatus::Declined => "declined",
            InquiryStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sent" => Some(InquiryStatus::Sent),
            "accepted" => Some(InquiryStatus::Accepted),
            "declined" => Some(InquiryStatus::Declined),
            "closed" => Some(InquiryStatus::Closed),
            _ => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, InquiryStatus::Declined | InquiryStatus::Closed)
    }
}

/// A contact request from a company to a consultant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: InquiryId,
    pub company_id: UserId,
    pub consultant_id: UserId,
    pub message: String,
    pub timing: Option<String>,
    pub mode: EngagementMode,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inbound payload for inquiry creation. `mode` arrives as free text and is
/// parsed against [`EngagementMode`] during intake.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInquiry {
    pub consultant_id: UserId,
    pub message: String,
    #[serde(default)]
    pub timing: Option<String>,
    pub mode: String,
}

/// Counterparty details embedded in inquiry listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyView {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// An inquiry joined with the accounts on both ends, as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct InquiryView {
    pub id: InquiryId,
    pub company: PartyView,
    pub consultant: PartyView,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    pub mode: EngagementMode,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A verified consultant joined with their account identity, as listed in the
/// public directory and the consultant detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsultantListing {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub profile: ConsultantProfile,
}
