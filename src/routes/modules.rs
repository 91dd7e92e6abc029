//! Module directory routes.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, api_error};
use crate::routes::auth::AuthUser;
use crate::services::module::{self, BulkEnrollOutcome, Enrollment, ModuleRow, ModuleWithEnrollment};
use crate::state::AppState;

pub(crate) fn module_error_response(err: &module::ModuleError) -> ApiError {
    use module::ModuleError;
    let status = match err {
        ModuleError::QueryTooShort | ModuleError::MissingField => StatusCode::UNPROCESSABLE_ENTITY,
        ModuleError::ClassIdTaken(_)
        | ModuleError::AlreadyEnrolled { .. }
        | ModuleError::NothingToEnroll => StatusCode::CONFLICT,
        ModuleError::NotFound(_) | ModuleError::NotEnrolled { .. } | ModuleError::UnknownModules => {
            StatusCode::NOT_FOUND
        }
        ModuleError::Database(e) => {
            tracing::error!(error = %e, "module operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, err)
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
}

/// `GET /api/modules/search?q=` — public substring search over the directory.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ModuleRow>>, ApiError> {
    let rows = module::search_modules(&state.pool, &params.q)
        .await
        .map_err(|e| module_error_response(&e))?;
    Ok(Json(rows))
}

/// `GET /api/modules` — list every module, name ascending.
pub async fn list_all(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<ModuleRow>>, ApiError> {
    let rows = module::list_all_modules(&state.pool)
        .await
        .map_err(|e| module_error_response(&e))?;
    Ok(Json(rows))
}

/// `GET /api/modules/mine` — list the current user's enrolled modules.
pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ModuleRow>>, ApiError> {
    let rows = module::list_user_modules(&state.pool, auth.user.id)
        .await
        .map_err(|e| module_error_response(&e))?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct CreateModuleBody {
    pub name: String,
    pub class_id: String,
    pub prof: String,
}

/// `POST /api/modules` — create a module with a unique class id.
pub async fn create(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(body): Json<CreateModuleBody>,
) -> Result<(StatusCode, Json<ModuleRow>), ApiError> {
    let row = module::create_module(&state.pool, &body.name, &body.class_id, &body.prof)
        .await
        .map_err(|e| module_error_response(&e))?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/modules/:id` — module detail with enrolled users and count.
pub async fn get_one(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(module_id): Path<Uuid>,
) -> Result<Json<ModuleWithEnrollment>, ApiError> {
    let detail = module::get_module_with_enrollment(&state.pool, module_id)
        .await
        .map_err(|e| module_error_response(&e))?;
    Ok(Json(detail))
}

/// `POST /api/modules/:id/enroll` — enroll the current user.
pub async fn enroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(module_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
    let enrollment = module::enroll(&state.pool, auth.user.id, module_id)
        .await
        .map_err(|e| module_error_response(&e))?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// `DELETE /api/modules/:id/enroll` — remove the current user's enrollment.
pub async fn unenroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(module_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    module::unenroll(&state.pool, auth.user.id, module_id)
        .await
        .map_err(|e| module_error_response(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct EnrollManyBody {
    pub module_ids: Vec<Uuid>,
}

/// `POST /api/modules/enroll-many` — bulk enroll, skipping existing pairs.
pub async fn enroll_many(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<EnrollManyBody>,
) -> Result<Json<BulkEnrollOutcome>, ApiError> {
    let outcome = module::enroll_many(&state.pool, auth.user.id, &body.module_ids)
        .await
        .map_err(|e| module_error_response(&e))?;
    Ok(Json(outcome))
}
