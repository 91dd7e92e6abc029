//! User profile routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, api_error};
use crate::routes::auth::AuthUser;
use crate::services::profile::{
    self, BasicInfoEdit, OnboardRequest, PeerMatch, ProfileCard, ProfileEdit, ShareCard, Skill,
    UserRecord, UserWithRelations,
};
use crate::state::AppState;

pub(crate) fn profile_error_response(err: &profile::ProfileError) -> ApiError {
    use profile::ProfileError;
    let status = match err {
        ProfileError::NotFound(_) | ProfileError::UnknownModule => StatusCode::NOT_FOUND,
        ProfileError::InvalidEnrollmentYear(_)
        | ProfileError::EmptySkillName { .. }
        | ProfileError::InvalidModuleEntry { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ProfileError::DuplicateSkill { .. } => StatusCode::CONFLICT,
        ProfileError::Database(e) => {
            tracing::error!(error = %e, "profile operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, err)
}

/// `GET /api/users/me/onboarded` — the routing gate for new sign-ins.
pub async fn onboarded(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let onboarded = profile::has_onboarded(&state.pool, auth.user.id)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(serde_json::json!({ "onboarded": onboarded })))
}

/// `GET /api/users/me` — current user with modules and forum posts.
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserWithRelations>, ApiError> {
    let user = profile::get_by_id(&state.pool, auth.user.id)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(user))
}

/// `GET /api/users/:id` — any user with modules and forum posts.
pub async fn get_one(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserWithRelations>, ApiError> {
    let user = profile::get_by_id(&state.pool, user_id)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(user))
}

/// `GET /api/users/:id/share-card` — public link-preview projection.
/// No identity required; leaks nothing beyond the five share fields.
pub async fn share_card(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ShareCard>, ApiError> {
    let card = profile::get_for_public_share(&state.pool, user_id)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(card))
}

/// `GET /api/users/:id/card` — peer-discovery card projection.
pub async fn card(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileCard>, ApiError> {
    let card = profile::get_for_card(&state.pool, user_id)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(card))
}

/// `POST /api/users/me/onboarding` — first-run partial profile update,
/// optionally replacing the enrollment set.
pub async fn onboard(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<OnboardRequest>,
) -> Result<Json<UserWithRelations>, ApiError> {
    let user = profile::onboard(&state.pool, auth.user.id, body)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(user))
}

/// `PATCH /api/users/me/profile` — full-profile partial update.
pub async fn edit_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ProfileEdit>,
) -> Result<Json<UserRecord>, ApiError> {
    let user = profile::edit_profile(&state.pool, auth.user.id, body)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(user))
}

/// `PATCH /api/users/me/basic-info` — name / year / course subset.
pub async fn edit_basic_info(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<BasicInfoEdit>,
) -> Result<Json<UserRecord>, ApiError> {
    let user = profile::edit_basic_info(&state.pool, auth.user.id, body)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct SkillsBody {
    pub skills: Vec<Skill>,
}

/// `PUT /api/users/me/hard-skills` — replace the hard-skill list.
pub async fn edit_hard_skills(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SkillsBody>,
) -> Result<Json<UserRecord>, ApiError> {
    let user = profile::edit_hard_skills(&state.pool, auth.user.id, body.skills)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(user))
}

/// `PUT /api/users/me/soft-skills` — replace the soft-skill list.
pub async fn edit_soft_skills(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SkillsBody>,
) -> Result<Json<UserRecord>, ApiError> {
    let user = profile::edit_soft_skills(&state.pool, auth.user.id, body.skills)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct TextBody {
    pub value: String,
}

/// `PUT /api/users/me/intro` — replace the intro text.
pub async fn edit_intro(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<TextBody>,
) -> Result<Json<UserRecord>, ApiError> {
    let user = profile::edit_intro(&state.pool, auth.user.id, body.value)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(user))
}

/// `PUT /api/users/me/banner` — replace the banner reference.
pub async fn edit_banner(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<TextBody>,
) -> Result<Json<UserRecord>, ApiError> {
    let user = profile::edit_banner(&state.pool, auth.user.id, body.value)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(user))
}

/// `PUT /api/users/me/project` — replace the project text.
pub async fn edit_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<TextBody>,
) -> Result<Json<UserRecord>, ApiError> {
    let user = profile::edit_project(&state.pool, auth.user.id, body.value)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(user))
}

/// `GET /api/users/me/recommendations` — peers sharing modules, overlap
/// descending with deterministic tie-break, capped at 10.
pub async fn recommendations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<PeerMatch>>, ApiError> {
    let peers = profile::recommend_peers(&state.pool, auth.user.id)
        .await
        .map_err(|e| profile_error_response(&e))?;
    Ok(Json(peers))
}
