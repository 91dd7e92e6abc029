//! Module directory service.
//!
//! DESIGN
//! ======
//! Modules carry a globally unique business key (`class_id`) next to their
//! surrogate id, and the user↔module relation lives in the
//! `module_enrollments` join table. Enrollment is idempotent by
//! construction, but asymmetrically so: a duplicate single enroll is a hard
//! conflict, while the bulk path treats duplicates as per-item no-ops and
//! only fails when the entire requested set is already enrolled. The two
//! call sites have different UX expectations and the asymmetry is
//! deliberate.

use sqlx::{PgPool, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::services::profile::PublicUser;
use crate::services::search::{self, SEARCH_RESULT_CAP};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("search query must be at least {} characters", search::MIN_QUERY_LEN)]
    QueryTooShort,
    #[error("module name, class id, and professor must not be empty")]
    MissingField,
    #[error("a module with class id {0:?} already exists")]
    ClassIdTaken(String),
    #[error("module not found: {0}")]
    NotFound(Uuid),
    #[error("user {user_id} is already enrolled in module {module_id}")]
    AlreadyEnrolled { user_id: Uuid, module_id: Uuid },
    #[error("user {user_id} is not enrolled in module {module_id}")]
    NotEnrolled { user_id: Uuid, module_id: Uuid },
    #[error("user is already enrolled in every requested module")]
    NothingToEnroll,
    #[error("one or more requested modules do not exist")]
    UnknownModules,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for ModuleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::QueryTooShort => "E_QUERY_TOO_SHORT",
            Self::MissingField => "E_MISSING_FIELD",
            Self::ClassIdTaken(_) => "E_CLASS_ID_TAKEN",
            Self::NotFound(_) | Self::UnknownModules => "E_MODULE_NOT_FOUND",
            Self::AlreadyEnrolled { .. } => "E_ALREADY_ENROLLED",
            Self::NotEnrolled { .. } => "E_NOT_ENROLLED",
            Self::NothingToEnroll => "E_NOTHING_TO_ENROLL",
            Self::Database(_) => "E_DATABASE",
        }
    }
}

/// Row returned from module queries.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModuleRow {
    pub id: Uuid,
    pub name: String,
    pub class_id: String,
    pub prof: String,
}

type ModuleTuple = (Uuid, String, String, String);

fn module_from_tuple((id, name, class_id, prof): ModuleTuple) -> ModuleRow {
    ModuleRow { id, name, class_id, prof }
}

/// One (user, module) pair in the enrollment relation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Enrollment {
    pub user_id: Uuid,
    pub module_id: Uuid,
}

/// Outcome of a bulk enroll: partial success is a success.
#[derive(Debug, serde::Serialize)]
pub struct BulkEnrollOutcome {
    pub created: usize,
    pub skipped: usize,
    pub message: String,
}

/// Module detail with the users currently enrolled in it.
#[derive(Debug, serde::Serialize)]
pub struct ModuleWithEnrollment {
    #[serde(flatten)]
    pub module: ModuleRow,
    pub enrolled_users_count: usize,
    pub enrolled_users: Vec<PublicUser>,
}

#[must_use]
pub fn bulk_enroll_message(created: usize, skipped: usize) -> String {
    format!("Added {created} modules, skipped {skipped} existing enrollments")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_foreign_key_violation)
}

// =============================================================================
// DIRECTORY
// =============================================================================

/// Case-insensitive substring search over module name and class id.
///
/// # Errors
///
/// Returns `QueryTooShort` when the trimmed query has fewer than two
/// characters, or a database error if the query fails.
pub async fn search_modules(pool: &PgPool, query: &str) -> Result<Vec<ModuleRow>, ModuleError> {
    let query = search::normalize_query(query).ok_or(ModuleError::QueryTooShort)?;
    let pattern = search::like_pattern(query);

    let rows = sqlx::query_as::<_, ModuleTuple>(
        r"SELECT id, name, class_id, prof
          FROM modules
          WHERE name ILIKE $1 ESCAPE '\' OR class_id ILIKE $1 ESCAPE '\'
          ORDER BY name ASC
          LIMIT $2",
    )
    .bind(&pattern)
    .bind(SEARCH_RESULT_CAP)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(module_from_tuple).collect())
}

/// List every module, name ascending.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_all_modules(pool: &PgPool) -> Result<Vec<ModuleRow>, ModuleError> {
    let rows = sqlx::query_as::<_, ModuleTuple>(
        "SELECT id, name, class_id, prof FROM modules ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(module_from_tuple).collect())
}

/// List the modules a user is enrolled in, name ascending.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_user_modules(pool: &PgPool, user_id: Uuid) -> Result<Vec<ModuleRow>, ModuleError> {
    let rows = sqlx::query_as::<_, ModuleTuple>(
        r"SELECT m.id, m.name, m.class_id, m.prof
          FROM module_enrollments e
          JOIN modules m ON m.id = e.module_id
          WHERE e.user_id = $1
          ORDER BY m.name ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(module_from_tuple).collect())
}

/// Create a module with a unique `class_id` business key.
///
/// # Errors
///
/// Returns `MissingField` when any field is blank, `ClassIdTaken` when the
/// class id already exists, or a database error.
pub async fn create_module(
    pool: &PgPool,
    name: &str,
    class_id: &str,
    prof: &str,
) -> Result<ModuleRow, ModuleError> {
    let (name, class_id, prof) = (name.trim(), class_id.trim(), prof.trim());
    if name.is_empty() || class_id.is_empty() || prof.is_empty() {
        return Err(ModuleError::MissingField);
    }

    let id = Uuid::new_v4();
    let result = sqlx::query(
        r"INSERT INTO modules (id, name, class_id, prof)
          VALUES ($1, $2, $3, $4)
          ON CONFLICT (class_id) DO NOTHING",
    )
    .bind(id)
    .bind(name)
    .bind(class_id)
    .bind(prof)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ModuleError::ClassIdTaken(class_id.to_owned()));
    }

    info!(%id, class_id, "module created");
    Ok(ModuleRow { id, name: name.to_owned(), class_id: class_id.to_owned(), prof: prof.to_owned() })
}

// =============================================================================
// ENROLLMENT
// =============================================================================

/// Enroll a user in a module. A duplicate pair is a hard conflict.
///
/// # Errors
///
/// Returns `AlreadyEnrolled` when the pair exists, `NotFound` when the
/// module row is absent, or a database error.
pub async fn enroll(pool: &PgPool, user_id: Uuid, module_id: Uuid) -> Result<Enrollment, ModuleError> {
    let result = sqlx::query(
        r"INSERT INTO module_enrollments (user_id, module_id)
          VALUES ($1, $2)
          ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(module_id)
    .execute(pool)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => Err(ModuleError::AlreadyEnrolled { user_id, module_id }),
        Ok(_) => {
            info!(%user_id, %module_id, "user enrolled in module");
            Ok(Enrollment { user_id, module_id })
        }
        Err(e) if is_foreign_key_violation(&e) => Err(ModuleError::NotFound(module_id)),
        Err(e) => Err(e.into()),
    }
}

/// Remove a user's enrollment in a module.
///
/// # Errors
///
/// Returns `NotEnrolled` when the pair does not exist, or a database error.
pub async fn unenroll(pool: &PgPool, user_id: Uuid, module_id: Uuid) -> Result<(), ModuleError> {
    let result = sqlx::query("DELETE FROM module_enrollments WHERE user_id = $1 AND module_id = $2")
        .bind(user_id)
        .bind(module_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ModuleError::NotEnrolled { user_id, module_id });
    }

    info!(%user_id, %module_id, "user unenrolled from module");
    Ok(())
}

/// Enroll a user in several modules at once, skipping existing pairs.
///
/// Set-differences the request against current enrollments and inserts only
/// the remainder. Fails only when nothing at all is left to insert.
///
/// # Errors
///
/// Returns `NothingToEnroll` when every requested module is already
/// enrolled (or the request is empty), `UnknownModules` when a requested id
/// does not resolve, or a database error.
pub async fn enroll_many(
    pool: &PgPool,
    user_id: Uuid,
    module_ids: &[Uuid],
) -> Result<BulkEnrollOutcome, ModuleError> {
    let mut requested: Vec<Uuid> = Vec::with_capacity(module_ids.len());
    for id in module_ids {
        if !requested.contains(id) {
            requested.push(*id);
        }
    }
    if requested.is_empty() {
        return Err(ModuleError::NothingToEnroll);
    }

    let existing: Vec<Uuid> = sqlx::query_scalar(
        "SELECT module_id FROM module_enrollments WHERE user_id = $1 AND module_id = ANY($2)",
    )
    .bind(user_id)
    .bind(&requested)
    .fetch_all(pool)
    .await?;

    let new_ids: Vec<Uuid> = requested
        .iter()
        .copied()
        .filter(|id| !existing.contains(id))
        .collect();
    if new_ids.is_empty() {
        return Err(ModuleError::NothingToEnroll);
    }

    let mut builder = QueryBuilder::new("INSERT INTO module_enrollments (user_id, module_id) ");
    builder.push_values(&new_ids, |mut row, module_id| {
        row.push_bind(user_id).push_bind(module_id);
    });
    builder.build().execute(pool).await.map_err(|e| {
        if is_foreign_key_violation(&e) {
            ModuleError::UnknownModules
        } else {
            e.into()
        }
    })?;

    let (created, skipped) = (new_ids.len(), existing.len());
    info!(%user_id, created, skipped, "bulk enrollment applied");
    Ok(BulkEnrollOutcome { created, skipped, message: bulk_enroll_message(created, skipped) })
}

/// Fetch a module together with its enrolled users and their count.
///
/// # Errors
///
/// Returns `NotFound` when the module id does not resolve, or a database
/// error.
pub async fn get_module_with_enrollment(
    pool: &PgPool,
    module_id: Uuid,
) -> Result<ModuleWithEnrollment, ModuleError> {
    let module = sqlx::query_as::<_, ModuleTuple>(
        "SELECT id, name, class_id, prof FROM modules WHERE id = $1",
    )
    .bind(module_id)
    .fetch_optional(pool)
    .await?
    .map(module_from_tuple)
    .ok_or(ModuleError::NotFound(module_id))?;

    let users = sqlx::query_as::<_, (Uuid, String, Option<String>, Option<String>)>(
        r"SELECT u.id, u.name, u.image, u.course
          FROM module_enrollments e
          JOIN users u ON u.id = e.user_id
          WHERE e.module_id = $1
          ORDER BY u.name ASC",
    )
    .bind(module_id)
    .fetch_all(pool)
    .await?;

    let enrolled_users: Vec<PublicUser> = users
        .into_iter()
        .map(|(id, name, image, course)| PublicUser { id, name, image, course })
        .collect();

    Ok(ModuleWithEnrollment { module, enrolled_users_count: enrolled_users.len(), enrolled_users })
}

#[cfg(test)]
#[path = "module_test.rs"]
mod tests;
