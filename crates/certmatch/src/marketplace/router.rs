use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::directory::{self, DirectoryQuery};
use super::domain::{CreateInquiry, InquiryId, ProfilePatch, UserId, UserRole};
use super::identity::{AuthError, Identity, IdentityResolver, RequestCredentials};
use super::inquiries::{InquiryError, InquiryService};
use super::profiles::{ProfileError, ProfileService};
use super::repository::RepositoryError;
use super::signup::{SignupError, SignupRequest, SignupService};

/// Shared handler state: the identity resolver plus the three services.
pub struct MarketplaceState {
    pub resolver: IdentityResolver,
    pub signup: SignupService,
    pub profiles: ProfileService,
    pub inquiries: InquiryService,
}

/// Router builder exposing the marketplace HTTP surface.
pub fn marketplace_router(state: Arc<MarketplaceState>) -> Router {
    Router::new()
        .route("/api/v1/auth/signup", post(signup_handler))
        .route(
            "/api/v1/inquiries",
            post(create_inquiry_handler).get(list_inquiries_handler),
        )
        .route("/api/v1/inquiries/:inquiry_id", put(update_inquiry_handler))
        .route("/api/v1/consultants", get(directory_handler))
        .route(
            "/api/v1/consultants/:consultant_id",
            get(consultant_detail_handler).put(update_profile_handler),
        )
        .route(
            "/api/v1/admin/consultants/:consultant_id/verify",
            put(verify_consultant_handler),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    pub(crate) status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    pub(crate) verified: bool,
}

pub(crate) async fn signup_handler(
    State(state): State<Arc<MarketplaceState>>,
    Json(request): Json<SignupRequest>,
) -> Response {
    match state.signup.signup(request) {
        Ok(account) => {
            let payload = json!({
                "user": {
                    "id": account.id,
                    "name": account.name,
                    "email": account.email,
                    "role": account.role.label(),
                }
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => signup_error_response(err),
    }
}

pub(crate) async fn create_inquiry_handler(
    State(state): State<Arc<MarketplaceState>>,
    headers: HeaderMap,
    Json(request): Json<CreateInquiry>,
) -> Response {
    let identity = match resolve_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    match state.inquiries.create(&identity, request) {
        Ok(inquiry) => (StatusCode::CREATED, Json(inquiry)).into_response(),
        Err(err) => inquiry_error_response(err),
    }
}

pub(crate) async fn list_inquiries_handler(
    State(state): State<Arc<MarketplaceState>>,
    headers: HeaderMap,
) -> Response {
    let identity = match resolve_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    match state.inquiries.list(&identity) {
        Ok(inquiries) => (StatusCode::OK, Json(json!({ "inquiries": inquiries }))).into_response(),
        Err(err) => inquiry_error_response(err),
    }
}

pub(crate) async fn update_inquiry_handler(
    State(state): State<Arc<MarketplaceState>>,
    headers: HeaderMap,
    Path(inquiry_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Response {
    let identity = match resolve_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    let id = InquiryId(inquiry_id);
    match state.inquiries.transition(&identity, &id, &change.status) {
        Ok(inquiry) => (StatusCode::OK, Json(inquiry)).into_response(),
        Err(err) => inquiry_error_response(err),
    }
}

pub(crate) async fn directory_handler(
    State(state): State<Arc<MarketplaceState>>,
    Query(query): Query<DirectoryQuery>,
) -> Response {
    let listings = match state.profiles.verified_listings() {
        Ok(listings) => listings,
        Err(err) => return profile_error_response(err),
    };

    let query = query.normalized();
    let matches: Vec<_> = directory::filter(&listings, &query)
        .into_iter()
        .cloned()
        .collect();

    (StatusCode::OK, Json(json!({ "consultants": matches }))).into_response()
}

pub(crate) async fn consultant_detail_handler(
    State(state): State<Arc<MarketplaceState>>,
    headers: HeaderMap,
    Path(consultant_id): Path<String>,
) -> Response {
    // Anonymous access is legitimate here; a failed resolve only means the
    // caller views the directory as the public does.
    let credentials = RequestCredentials::from_headers(&headers);
    let viewer = state.resolver.resolve(&credentials).ok();

    let target = UserId(consultant_id);
    match state.profiles.get(&target, viewer.as_ref()) {
        Ok(listing) => (StatusCode::OK, Json(json!({ "consultant": listing }))).into_response(),
        Err(err) => profile_error_response(err),
    }
}

pub(crate) async fn update_profile_handler(
    State(state): State<Arc<MarketplaceState>>,
    headers: HeaderMap,
    Path(consultant_id): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> Response {
    let identity = match resolve_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    let target = UserId(consultant_id);
    match state.profiles.update(&identity, &target, &patch) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => profile_error_response(err),
    }
}

pub(crate) async fn verify_consultant_handler(
    State(state): State<Arc<MarketplaceState>>,
    headers: HeaderMap,
    Path(consultant_id): Path<String>,
    Json(request): Json<VerifyRequest>,
) -> Response {
    let identity = match resolve_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    // The profile service checks again; this handler is the admin surface
    // and refuses non-admin callers before touching anything.
    if identity.role != UserRole::Admin {
        return error_response(StatusCode::FORBIDDEN, "not allowed");
    }

    let target = UserId(consultant_id);
    match state
        .profiles
        .set_verified(&identity, &target, request.verified)
    {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => profile_error_response(err),
    }
}

fn resolve_identity(state: &MarketplaceState, headers: &HeaderMap) -> Result<Identity, Response> {
    let credentials = RequestCredentials::from_headers(headers);
    state.resolver.resolve(&credentials).map_err(|err| match err {
        AuthError::Unauthenticated => {
            error_response(StatusCode::UNAUTHORIZED, "authentication required")
        }
        AuthError::Directory(_) => {
            error_response(StatusCode::BAD_GATEWAY, "identity provider unavailable")
        }
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn inquiry_error_response(err: InquiryError) -> Response {
    let status = match &err {
        InquiryError::Forbidden => StatusCode::FORBIDDEN,
        InquiryError::EmptyMessage
        | InquiryError::InvalidMode(_)
        | InquiryError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        InquiryError::IllegalTransition { .. } => StatusCode::CONFLICT,
        InquiryError::ConsultantNotFound | InquiryError::NotFound => StatusCode::NOT_FOUND,
        InquiryError::Repository(err) => return repository_error_response(err),
    };
    error_response(status, &err.to_string())
}

fn profile_error_response(err: ProfileError) -> Response {
    let status = match &err {
        ProfileError::Forbidden => StatusCode::FORBIDDEN,
        ProfileError::NotFound => StatusCode::NOT_FOUND,
        ProfileError::Repository(err) => return repository_error_response(err),
    };
    error_response(status, &err.to_string())
}

fn signup_error_response(err: SignupError) -> Response {
    let status = match &err {
        SignupError::MissingField(_) | SignupError::InvalidRole(_) => StatusCode::BAD_REQUEST,
        SignupError::EmailInUse => StatusCode::CONFLICT,
        SignupError::Auth(_) => StatusCode::BAD_GATEWAY,
        SignupError::Repository(err) => return repository_error_response(err),
    };
    error_response(status, &err.to_string())
}

fn repository_error_response(err: &RepositoryError) -> Response {
    let status = match err {
        RepositoryError::Unavailable(_) => StatusCode::BAD_GATEWAY,
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
    };
    error_response(status, "record store failure")
}
