//! Forum listing service.
//!
//! DESIGN
//! ======
//! Forum posts are owned exclusively by their creator. Mutations gate on a
//! single combined `WHERE id = $1 AND owner_id = $2` lookup instead of
//! fetch-then-compare, so a caller cannot distinguish "does not exist" from
//! "exists but not mine" — both collapse into the same not-found error.
//! Like/share counters are incremented in SQL (`likes = likes + 1`) so
//! concurrent callers never lose updates.

use sqlx::{PgPool, QueryBuilder};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::services::profile::PublicUser;
use crate::services::search::{self, SEARCH_RESULT_CAP};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ForumError {
    #[error("forum title must not be empty")]
    EmptyTitle,
    #[error("forum post not found or not permitted: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for ForumError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "E_EMPTY_TITLE",
            Self::NotFound(_) => "E_FORUM_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
        }
    }
}

/// Fixed category attached to every forum post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Project,
    Study,
    Startup,
    Competition,
}

impl Tag {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Study => "study",
            Self::Startup => "startup",
            Self::Competition => "competition",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "project" => Some(Self::Project),
            "study" => Some(Self::Study),
            "startup" => Some(Self::Startup),
            "competition" => Some(Self::Competition),
            _ => None,
        }
    }
}

/// Row returned from forum queries. The tag is kept as stored text; the
/// schema constrains it to the [`Tag`] set at write time.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ForumRow {
    pub id: Uuid,
    pub title: String,
    pub tag: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub likes: i32,
    pub shares: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub owner_id: Uuid,
}

/// Forum post augmented with the minimal public view of its owner.
#[derive(Debug, serde::Serialize)]
pub struct ForumWithOwner {
    #[serde(flatten)]
    pub forum: ForumRow,
    pub user: PublicUser,
}

/// Partial edit: only supplied fields are changed.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ForumEdit {
    pub title: Option<String>,
    pub tag: Option<Tag>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
}

type ForumTuple = (Uuid, String, String, Option<OffsetDateTime>, i32, i32, OffsetDateTime, Uuid);
type ForumOwnerTuple = (
    Uuid,
    String,
    String,
    Option<OffsetDateTime>,
    i32,
    i32,
    OffsetDateTime,
    Uuid,
    String,
    Option<String>,
    Option<String>,
);

fn forum_from_tuple(
    (id, title, tag, deadline, likes, shares, created_at, owner_id): ForumTuple,
) -> ForumRow {
    ForumRow { id, title, tag, deadline, likes, shares, created_at, owner_id }
}

fn forum_with_owner_from_tuple(row: ForumOwnerTuple) -> ForumWithOwner {
    let (id, title, tag, deadline, likes, shares, created_at, owner_id, name, image, course) = row;
    ForumWithOwner {
        forum: ForumRow { id, title, tag, deadline, likes, shares, created_at, owner_id },
        user: PublicUser { id: owner_id, name, image, course },
    }
}

const FORUM_OWNER_SELECT: &str = r"SELECT f.id, f.title, f.tag, f.deadline, f.likes, f.shares,
                 f.created_at, f.owner_id, u.name, u.image, u.course
          FROM forums f
          JOIN users u ON u.id = f.owner_id";

pub(crate) fn normalize_title(title: &str) -> Option<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

// =============================================================================
// LISTING / SEARCH
// =============================================================================

/// List every forum post, newest first, each with its owner's public view.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_all(pool: &PgPool) -> Result<Vec<ForumWithOwner>, ForumError> {
    let rows = sqlx::query_as::<_, ForumOwnerTuple>(&format!(
        "{FORUM_OWNER_SELECT} ORDER BY f.created_at DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(forum_with_owner_from_tuple).collect())
}

/// Case-insensitive substring search on title, newest first, capped at 10.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn search_by_title(pool: &PgPool, query: &str) -> Result<Vec<ForumWithOwner>, ForumError> {
    let pattern = search::like_pattern(query.trim());
    let rows = sqlx::query_as::<_, ForumOwnerTuple>(&format!(
        r"{FORUM_OWNER_SELECT}
          WHERE f.title ILIKE $1 ESCAPE '\'
          ORDER BY f.created_at DESC
          LIMIT $2"
    ))
    .bind(&pattern)
    .bind(SEARCH_RESULT_CAP)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(forum_with_owner_from_tuple).collect())
}

/// List posts whose tag is in the given set, newest first, uncapped.
/// An empty set matches nothing.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_by_tags(pool: &PgPool, tags: &[Tag]) -> Result<Vec<ForumWithOwner>, ForumError> {
    if tags.is_empty() {
        return Ok(Vec::new());
    }

    let tag_names: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
    let rows = sqlx::query_as::<_, ForumOwnerTuple>(&format!(
        "{FORUM_OWNER_SELECT} WHERE f.tag = ANY($1) ORDER BY f.created_at DESC"
    ))
    .bind(&tag_names)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(forum_with_owner_from_tuple).collect())
}

/// Conjunction of the title substring filter and, when tags are supplied,
/// the tag-membership filter. Newest first, capped at 10.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn search(
    pool: &PgPool,
    query: &str,
    tags: Option<&[Tag]>,
) -> Result<Vec<ForumWithOwner>, ForumError> {
    let pattern = search::like_pattern(query.trim());

    let mut builder = QueryBuilder::new(FORUM_OWNER_SELECT);
    builder.push(" WHERE f.title ILIKE ");
    builder.push_bind(pattern);
    builder.push(r" ESCAPE '\'");

    if let Some(tags) = tags.filter(|t| !t.is_empty()) {
        builder.push(" AND f.tag IN (");
        {
            let mut separated = builder.separated(", ");
            for tag in tags {
                separated.push_bind(tag.as_str());
            }
        }
        builder.push(")");
    }

    builder.push(" ORDER BY f.created_at DESC LIMIT ");
    builder.push_bind(SEARCH_RESULT_CAP);

    let rows = builder
        .build_query_as::<ForumOwnerTuple>()
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(forum_with_owner_from_tuple).collect())
}

// =============================================================================
// MUTATION
// =============================================================================

/// Create a forum post owned by `owner_id`, with zeroed counters.
///
/// # Errors
///
/// Returns `EmptyTitle` when the trimmed title is empty, or a database
/// error.
pub async fn create(
    pool: &PgPool,
    owner_id: Uuid,
    title: &str,
    tag: Tag,
    deadline: Option<OffsetDateTime>,
) -> Result<ForumRow, ForumError> {
    let title = normalize_title(title).ok_or(ForumError::EmptyTitle)?;

    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, ForumTuple>(
        r"INSERT INTO forums (id, title, tag, deadline, owner_id)
          VALUES ($1, $2, $3, $4, $5)
          RETURNING id, title, tag, deadline, likes, shares, created_at, owner_id",
    )
    .bind(id)
    .bind(title)
    .bind(tag.as_str())
    .bind(deadline)
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    info!(%id, %owner_id, tag = tag.as_str(), "forum post created");
    Ok(forum_from_tuple(row))
}

/// Delete a forum post. Succeeds only when a row exists with this id AND
/// this owner; anything else is the collapsed not-found error.
///
/// # Errors
///
/// Returns `NotFound` when no matching (id, owner) row exists, or a
/// database error.
pub async fn delete(pool: &PgPool, requester_id: Uuid, forum_id: Uuid) -> Result<(), ForumError> {
    let result = sqlx::query("DELETE FROM forums WHERE id = $1 AND owner_id = $2")
        .bind(forum_id)
        .bind(requester_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ForumError::NotFound(forum_id));
    }

    info!(%forum_id, %requester_id, "forum post deleted");
    Ok(())
}

/// Edit a forum post's title/tag/deadline; only supplied fields change.
/// Same combined ownership predicate as [`delete`].
///
/// # Errors
///
/// Returns `EmptyTitle` when a supplied title trims to empty, `NotFound`
/// when no matching (id, owner) row exists, or a database error.
pub async fn edit(
    pool: &PgPool,
    requester_id: Uuid,
    forum_id: Uuid,
    changes: ForumEdit,
) -> Result<ForumRow, ForumError> {
    let title = match changes.title.as_deref() {
        Some(raw) => Some(normalize_title(raw).ok_or(ForumError::EmptyTitle)?.to_owned()),
        None => None,
    };

    let row = sqlx::query_as::<_, ForumTuple>(
        r"UPDATE forums
          SET title = COALESCE($3, title),
              tag = COALESCE($4, tag),
              deadline = COALESCE($5, deadline)
          WHERE id = $1 AND owner_id = $2
          RETURNING id, title, tag, deadline, likes, shares, created_at, owner_id",
    )
    .bind(forum_id)
    .bind(requester_id)
    .bind(title)
    .bind(changes.tag.map(Tag::as_str))
    .bind(changes.deadline)
    .fetch_optional(pool)
    .await?
    .ok_or(ForumError::NotFound(forum_id))?;

    Ok(forum_from_tuple(row))
}

/// Increment the like counter. Atomic add in SQL; any caller may like.
///
/// # Errors
///
/// Returns `NotFound` when the id is absent, or a database error.
pub async fn like(pool: &PgPool, forum_id: Uuid) -> Result<ForumRow, ForumError> {
    bump_counter(pool, forum_id, "likes").await
}

/// Increment the share counter. Same semantics as [`like`].
///
/// # Errors
///
/// Returns `NotFound` when the id is absent, or a database error.
pub async fn share(pool: &PgPool, forum_id: Uuid) -> Result<ForumRow, ForumError> {
    bump_counter(pool, forum_id, "shares").await
}

async fn bump_counter(pool: &PgPool, forum_id: Uuid, column: &str) -> Result<ForumRow, ForumError> {
    // `column` is one of two compile-time constants, never user input.
    let row = sqlx::query_as::<_, ForumTuple>(&format!(
        r"UPDATE forums
          SET {column} = {column} + 1
          WHERE id = $1
          RETURNING id, title, tag, deadline, likes, shares, created_at, owner_id"
    ))
    .bind(forum_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ForumError::NotFound(forum_id))?;

    Ok(forum_from_tuple(row))
}

#[cfg(test)]
#[path = "forum_test.rs"]
mod tests;
