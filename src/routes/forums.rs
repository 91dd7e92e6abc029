//! Forum listing routes.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody, api_error};
use crate::routes::auth::AuthUser;
use crate::services::forum::{self, ForumEdit, ForumRow, ForumWithOwner, Tag};
use crate::state::AppState;

pub(crate) fn forum_error_response(err: &forum::ForumError) -> ApiError {
    use forum::ForumError;
    let status = match err {
        ForumError::EmptyTitle => StatusCode::UNPROCESSABLE_ENTITY,
        ForumError::NotFound(_) => StatusCode::NOT_FOUND,
        ForumError::Database(e) => {
            tracing::error!(error = %e, "forum operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, err)
}

fn invalid_tag_response(raw: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorBody { error: "E_INVALID_TAG", message: format!("unknown tag {raw:?}") }),
    )
}

/// Parse a comma-separated tag list from a query parameter.
fn parse_tags(raw: &str) -> Result<Vec<Tag>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Tag::from_str(s).ok_or_else(|| invalid_tag_response(s)))
        .collect()
}

/// `GET /api/forums` — every post, newest first, with owner public view.
pub async fn list_all(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<ForumWithOwner>>, ApiError> {
    let rows = forum::list_all(&state.pool)
        .await
        .map_err(|e| forum_error_response(&e))?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub tags: Option<String>,
}

/// `GET /api/forums/search?q=&tags=` — title substring search, optionally
/// conjoined with a tag filter. Newest first, capped.
pub async fn search(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ForumWithOwner>>, ApiError> {
    let rows = match params.tags.as_deref() {
        Some(raw) => {
            let tags = parse_tags(raw)?;
            forum::search(&state.pool, &params.q, Some(&tags)).await
        }
        None => forum::search_by_title(&state.pool, &params.q).await,
    }
    .map_err(|e| forum_error_response(&e))?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct TaggedParams {
    pub tags: String,
}

/// `GET /api/forums/tagged?tags=` — posts whose tag is in the set, newest
/// first, uncapped.
pub async fn list_tagged(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<TaggedParams>,
) -> Result<Json<Vec<ForumWithOwner>>, ApiError> {
    let tags = parse_tags(&params.tags)?;
    let rows = forum::list_by_tags(&state.pool, &tags)
        .await
        .map_err(|e| forum_error_response(&e))?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct CreateForumBody {
    pub title: String,
    pub tag: Tag,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
}

/// `POST /api/forums` — create a post owned by the current user.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateForumBody>,
) -> Result<(StatusCode, Json<ForumRow>), ApiError> {
    let row = forum::create(&state.pool, auth.user.id, &body.title, body.tag, body.deadline)
        .await
        .map_err(|e| forum_error_response(&e))?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PATCH /api/forums/:id` — owner-gated partial edit.
pub async fn edit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(forum_id): Path<Uuid>,
    Json(body): Json<ForumEdit>,
) -> Result<Json<ForumRow>, ApiError> {
    let row = forum::edit(&state.pool, auth.user.id, forum_id, body)
        .await
        .map_err(|e| forum_error_response(&e))?;
    Ok(Json(row))
}

/// `DELETE /api/forums/:id` — owner-gated delete.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(forum_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    forum::delete(&state.pool, auth.user.id, forum_id)
        .await
        .map_err(|e| forum_error_response(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/forums/:id/like` — atomic like increment, no ownership gate.
pub async fn like(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(forum_id): Path<Uuid>,
) -> Result<Json<ForumRow>, ApiError> {
    let row = forum::like(&state.pool, forum_id)
        .await
        .map_err(|e| forum_error_response(&e))?;
    Ok(Json(row))
}

/// `POST /api/forums/:id/share` — atomic share increment.
pub async fn share(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(forum_id): Path<Uuid>,
) -> Result<Json<ForumRow>, ApiError> {
    let row = forum::share(&state.pool, forum_id)
        .await
        .map_err(|e| forum_error_response(&e))?;
    Ok(Json(row))
}
