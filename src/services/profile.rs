//! User profile service.
//!
//! DESIGN
//! ======
//! Profiles are filled in progressively after first sign-in: onboarding and
//! the narrow edit operations are all partial updates against the caller's
//! own row. Skill lists live as JSONB on the user row and every write path
//! revalidates the case-insensitive uniqueness invariant before storing.
//! Enrollment replacement during onboarding is a set reconciliation — only
//! the needed inserts and deletes are issued, so there is no window where
//! the user's enrollments have been cleared but not yet recreated.

use std::collections::{HashMap, HashSet};

use sqlx::types::Json;
use sqlx::{PgPool, QueryBuilder};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::services::forum::ForumRow;
use crate::services::module::ModuleRow;

/// Result cap for peer recommendations.
pub const RECOMMENDATION_CAP: usize = 10;

const MIN_ENROLLMENT_YEAR: i32 = 1900;
const MAX_ENROLLMENT_YEAR: i32 = 2030;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error("enrollment year {0} is outside {MIN_ENROLLMENT_YEAR}..={MAX_ENROLLMENT_YEAR}")]
    InvalidEnrollmentYear(i32),
    #[error("skill at index {index} has an empty name")]
    EmptySkillName { index: usize },
    #[error("duplicate skill {name:?} at index {index}")]
    DuplicateSkill { index: usize, name: String },
    #[error("module entry at index {index} is missing name, class id, or professor")]
    InvalidModuleEntry { index: usize },
    #[error("one or more selected modules do not exist")]
    UnknownModule,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for ProfileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_USER_NOT_FOUND",
            Self::InvalidEnrollmentYear(_) => "E_INVALID_ENROLLMENT_YEAR",
            Self::EmptySkillName { .. } => "E_EMPTY_SKILL_NAME",
            Self::DuplicateSkill { .. } => "E_DUPLICATE_SKILL",
            Self::InvalidModuleEntry { .. } => "E_INVALID_MODULE_ENTRY",
            Self::UnknownModule => "E_MODULE_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
        }
    }
}

/// Fixed set of courses offered by the campus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Course {
    ComputerScience,
    InformationSystems,
    Business,
    Economics,
    Law,
    Accountancy,
}

impl Course {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ComputerScience => "computer_science",
            Self::InformationSystems => "information_systems",
            Self::Business => "business",
            Self::Economics => "economics",
            Self::Law => "law",
            Self::Accountancy => "accountancy",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "computer_science" => Some(Self::ComputerScience),
            "information_systems" => Some(Self::InformationSystems),
            "business" => Some(Self::Business),
            "economics" => Some(Self::Economics),
            "law" => Some(Self::Law),
            "accountancy" => Some(Self::Accountancy),
            _ => None,
        }
    }
}

/// One entry in a user's hard- or soft-skill list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Skill {
    pub skill_name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub skill_type: Option<String>,
}

/// Minimal public view of a user, safe for unauthenticated callers and for
/// attachment to forum posts and module rosters.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub course: Option<String>,
}

/// Full profile row as stored.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub enrollment_year: Option<i32>,
    pub course: Option<String>,
    pub intro: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub project: Option<String>,
    pub interest: Option<String>,
    pub hard_skills: Vec<Skill>,
    pub soft_skills: Vec<Skill>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Profile plus enrolled modules and owned forum posts.
#[derive(Debug, serde::Serialize)]
pub struct UserWithRelations {
    #[serde(flatten)]
    pub user: UserRecord,
    pub modules: Vec<ModuleRow>,
    pub forum_posts: Vec<ForumRow>,
}

/// Projection for unauthenticated link previews.
#[derive(Debug, serde::Serialize)]
pub struct ShareCard {
    pub id: Uuid,
    pub name: String,
    pub course: Option<String>,
    pub image: Option<String>,
    pub intro: Option<String>,
}

/// Projection for peer-discovery cards.
#[derive(Debug, serde::Serialize)]
pub struct ProfileCard {
    pub id: Uuid,
    pub name: String,
    pub course: Option<String>,
    pub enrollment_year: Option<i32>,
    pub image: Option<String>,
    pub intro: Option<String>,
    pub hard_skills: Vec<Skill>,
    pub soft_skills: Vec<Skill>,
    pub interest: Option<String>,
}

/// Peer fields carried through recommendation ranking.
#[derive(Debug, serde::Serialize)]
pub struct PeerUser {
    pub id: Uuid,
    pub name: String,
    pub course: Option<String>,
    pub enrollment_year: Option<i32>,
    pub image: Option<String>,
    pub intro: Option<String>,
}

/// A recommended peer with the modules shared with the current user.
#[derive(Debug, serde::Serialize)]
pub struct PeerMatch {
    #[serde(flatten)]
    pub user: PeerUser,
    pub shared_modules_count: usize,
    pub shared_modules: Vec<ModuleRow>,
}

/// Module reference inside an onboarding request: either an existing row or
/// a request to create one, upserted by its `class_id` business key.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleSelection {
    Existing { id: Uuid },
    New { name: String, class_id: String, prof: String },
}

/// Onboarding / profile-creation request. Every field is optional.
#[derive(Debug, Default, serde::Deserialize)]
pub struct OnboardRequest {
    pub name: Option<String>,
    pub enrollment_year: Option<i32>,
    pub course: Option<Course>,
    pub project: Option<String>,
    pub interest: Option<String>,
    pub hard_skills: Option<Vec<Skill>>,
    pub soft_skills: Option<Vec<Skill>>,
    pub modules: Option<Vec<ModuleSelection>>,
}

/// Full-profile partial update; supplied fields overwrite, absent fields
/// stay untouched.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ProfileEdit {
    pub name: Option<String>,
    pub enrollment_year: Option<i32>,
    pub course: Option<Course>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub intro: Option<String>,
    pub project: Option<String>,
    pub interest: Option<String>,
    pub hard_skills: Option<Vec<Skill>>,
    pub soft_skills: Option<Vec<Skill>>,
}

/// Name / enrollment year / course subset of [`ProfileEdit`].
#[derive(Debug, Default, serde::Deserialize)]
pub struct BasicInfoEdit {
    pub name: Option<String>,
    pub enrollment_year: Option<i32>,
    pub course: Option<Course>,
}

// =============================================================================
// VALIDATION HELPERS
// =============================================================================

/// Trim skill names and types, rejecting empty names and case-insensitive
/// duplicates. The error names the offending index and skill.
pub fn validate_skills(skills: &[Skill]) -> Result<Vec<Skill>, ProfileError> {
    let mut seen: HashSet<String> = HashSet::with_capacity(skills.len());
    let mut out = Vec::with_capacity(skills.len());

    for (index, skill) in skills.iter().enumerate() {
        let name = skill.skill_name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptySkillName { index });
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(ProfileError::DuplicateSkill { index, name: name.to_owned() });
        }
        out.push(Skill {
            skill_name: name.to_owned(),
            skill_type: skill
                .skill_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned),
        });
    }

    Ok(out)
}

fn validate_enrollment_year(year: i32) -> Result<i32, ProfileError> {
    if (MIN_ENROLLMENT_YEAR..=MAX_ENROLLMENT_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(ProfileError::InvalidEnrollmentYear(year))
    }
}

/// Onboarding submits empty strings for untouched text areas; those mean
/// "unset", not a literal empty value.
pub(crate) fn blank_to_none(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

/// Rank peer rows by shared-module count descending, tie-broken by user id
/// ascending so the order is deterministic, capped at `cap`.
#[must_use]
pub fn rank_peers(rows: Vec<(PeerUser, ModuleRow)>, cap: usize) -> Vec<PeerMatch> {
    let mut by_user: HashMap<Uuid, PeerMatch> = HashMap::new();
    for (user, module) in rows {
        let entry = by_user.entry(user.id).or_insert_with(|| PeerMatch {
            user,
            shared_modules_count: 0,
            shared_modules: Vec::new(),
        });
        entry.shared_modules.push(module);
        entry.shared_modules_count += 1;
    }

    let mut matches: Vec<PeerMatch> = by_user.into_values().collect();
    matches.sort_by(|a, b| {
        b.shared_modules_count
            .cmp(&a.shared_modules_count)
            .then(a.user.id.cmp(&b.user.id))
    });
    matches.truncate(cap);
    matches
}

// =============================================================================
// ROW MAPPING
// =============================================================================

type UserTuple = (
    Uuid,
    String,
    String,
    Option<i32>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Json<Vec<Skill>>,
    Json<Vec<Skill>>,
    OffsetDateTime,
);

const USER_COLUMNS: &str = "id, email, name, enrollment_year, course, intro, image, banner, \
                            project, interest, hard_skills, soft_skills, created_at";

fn user_from_tuple(row: UserTuple) -> UserRecord {
    let (
        id,
        email,
        name,
        enrollment_year,
        course,
        intro,
        image,
        banner,
        project,
        interest,
        hard_skills,
        soft_skills,
        created_at,
    ) = row;
    UserRecord {
        id,
        email,
        name,
        enrollment_year,
        course,
        intro,
        image,
        banner,
        project,
        interest,
        hard_skills: hard_skills.0,
        soft_skills: soft_skills.0,
        created_at,
    }
}

async fn fetch_user(pool: &PgPool, user_id: Uuid) -> Result<UserRecord, ProfileError> {
    sqlx::query_as::<_, UserTuple>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .map(user_from_tuple)
        .ok_or(ProfileError::NotFound(user_id))
}

// =============================================================================
// READS
// =============================================================================

/// Whether the user has completed onboarding: true iff the enrollment-year
/// field is set. This is the sole routing gate for new sign-ins.
///
/// # Errors
///
/// Returns `NotFound` when the user id does not resolve, or a database
/// error.
pub async fn has_onboarded(pool: &PgPool, user_id: Uuid) -> Result<bool, ProfileError> {
    sqlx::query_scalar::<_, bool>("SELECT enrollment_year IS NOT NULL FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ProfileError::NotFound(user_id))
}

/// Fetch a full profile with enrolled modules and owned forum posts.
///
/// # Errors
///
/// Returns `NotFound` when the user id does not resolve, or a database
/// error.
pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> Result<UserWithRelations, ProfileError> {
    let user = fetch_user(pool, user_id).await?;

    let modules = sqlx::query_as::<_, (Uuid, String, String, String)>(
        r"SELECT m.id, m.name, m.class_id, m.prof
          FROM module_enrollments e
          JOIN modules m ON m.id = e.module_id
          WHERE e.user_id = $1
          ORDER BY m.name ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(id, name, class_id, prof)| ModuleRow { id, name, class_id, prof })
    .collect();

    let forum_posts = sqlx::query_as::<_, (Uuid, String, String, Option<OffsetDateTime>, i32, i32, OffsetDateTime, Uuid)>(
        r"SELECT id, title, tag, deadline, likes, shares, created_at, owner_id
          FROM forums
          WHERE owner_id = $1
          ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(id, title, tag, deadline, likes, shares, created_at, owner_id)| ForumRow {
        id,
        title,
        tag,
        deadline,
        likes,
        shares,
        created_at,
        owner_id,
    })
    .collect();

    Ok(UserWithRelations { user, modules, forum_posts })
}

/// Minimal projection for unauthenticated link previews.
///
/// # Errors
///
/// Returns `NotFound` when the user id does not resolve, or a database
/// error.
pub async fn get_for_public_share(pool: &PgPool, user_id: Uuid) -> Result<ShareCard, ProfileError> {
    sqlx::query_as::<_, (Uuid, String, Option<String>, Option<String>, Option<String>)>(
        "SELECT id, name, course, image, intro FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .map(|(id, name, course, image, intro)| ShareCard { id, name, course, image, intro })
    .ok_or(ProfileError::NotFound(user_id))
}

/// Projection for peer-discovery cards.
///
/// # Errors
///
/// Returns `NotFound` when the user id does not resolve, or a database
/// error.
pub async fn get_for_card(pool: &PgPool, user_id: Uuid) -> Result<ProfileCard, ProfileError> {
    type CardTuple = (
        Uuid,
        String,
        Option<String>,
        Option<i32>,
        Option<String>,
        Option<String>,
        Json<Vec<Skill>>,
        Json<Vec<Skill>>,
        Option<String>,
    );

    sqlx::query_as::<_, CardTuple>(
        r"SELECT id, name, course, enrollment_year, image, intro,
                 hard_skills, soft_skills, interest
          FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .map(
        |(id, name, course, enrollment_year, image, intro, hard_skills, soft_skills, interest)| {
            ProfileCard {
                id,
                name,
                course,
                enrollment_year,
                image,
                intro,
                hard_skills: hard_skills.0,
                soft_skills: soft_skills.0,
                interest,
            }
        },
    )
    .ok_or(ProfileError::NotFound(user_id))
}

// =============================================================================
// ONBOARDING
// =============================================================================

/// Partial profile update used by first-run onboarding.
///
/// Every field is optional; blank `project`/`interest` values are
/// normalized to unset. When `modules` is supplied it replaces the user's
/// entire enrollment set through reconciliation, and `new` entries are
/// upserted by `class_id` so two users racing to create the same class
/// cannot produce duplicate module rows.
///
/// # Errors
///
/// Returns a validation error for out-of-range years, bad skill lists or
/// blank new-module entries; `UnknownModule` when an existing-module id
/// does not resolve; `NotFound` when the user row is absent; or a database
/// error.
pub async fn onboard(
    pool: &PgPool,
    user_id: Uuid,
    request: OnboardRequest,
) -> Result<UserWithRelations, ProfileError> {
    let name = request.name.and_then(blank_to_none);
    let enrollment_year = request
        .enrollment_year
        .map(validate_enrollment_year)
        .transpose()?;
    let hard_skills = request.hard_skills.as_deref().map(validate_skills).transpose()?;
    let soft_skills = request.soft_skills.as_deref().map(validate_skills).transpose()?;

    let mut builder = QueryBuilder::new("UPDATE users SET ");
    let mut wrote_any = false;
    {
        let mut sets = builder.separated(", ");
        if let Some(name) = name {
            sets.push("name = ").push_bind_unseparated(name);
            wrote_any = true;
        }
        if let Some(year) = enrollment_year {
            sets.push("enrollment_year = ").push_bind_unseparated(year);
            wrote_any = true;
        }
        if let Some(course) = request.course {
            sets.push("course = ").push_bind_unseparated(course.as_str());
            wrote_any = true;
        }
        if let Some(project) = request.project {
            sets.push("project = ").push_bind_unseparated(blank_to_none(project));
            wrote_any = true;
        }
        if let Some(interest) = request.interest {
            sets.push("interest = ").push_bind_unseparated(blank_to_none(interest));
            wrote_any = true;
        }
        if let Some(skills) = hard_skills {
            sets.push("hard_skills = ").push_bind_unseparated(Json(skills));
            wrote_any = true;
        }
        if let Some(skills) = soft_skills {
            sets.push("soft_skills = ").push_bind_unseparated(Json(skills));
            wrote_any = true;
        }
    }

    if wrote_any {
        builder.push(" WHERE id = ");
        builder.push_bind(user_id);
        let result = builder.build().execute(pool).await?;
        if result.rows_affected() == 0 {
            return Err(ProfileError::NotFound(user_id));
        }
    }

    if let Some(selections) = request.modules {
        let desired = resolve_module_selections(pool, &selections).await?;
        reconcile_enrollments(pool, user_id, &desired).await?;
    }

    info!(%user_id, "onboarding update applied");
    get_by_id(pool, user_id).await
}

async fn resolve_module_selections(
    pool: &PgPool,
    selections: &[ModuleSelection],
) -> Result<Vec<Uuid>, ProfileError> {
    let mut desired: Vec<Uuid> = Vec::with_capacity(selections.len());
    for (index, selection) in selections.iter().enumerate() {
        let id = match selection {
            ModuleSelection::Existing { id } => *id,
            ModuleSelection::New { name, class_id, prof } => {
                let (name, class_id, prof) = (name.trim(), class_id.trim(), prof.trim());
                if name.is_empty() || class_id.is_empty() || prof.is_empty() {
                    return Err(ProfileError::InvalidModuleEntry { index });
                }
                sqlx::query_scalar::<_, Uuid>(
                    r"INSERT INTO modules (id, name, class_id, prof)
                      VALUES ($1, $2, $3, $4)
                      ON CONFLICT (class_id) DO UPDATE SET name = EXCLUDED.name, prof = EXCLUDED.prof
                      RETURNING id",
                )
                .bind(Uuid::new_v4())
                .bind(name)
                .bind(class_id)
                .bind(prof)
                .fetch_one(pool)
                .await?
            }
        };
        if !desired.contains(&id) {
            desired.push(id);
        }
    }
    Ok(desired)
}

/// Diff the desired enrollment set against the current one and issue only
/// the needed deletes and inserts. No explicit transaction: a crash between
/// the two statements leaves a partial set, which is an accepted risk of
/// this layer.
async fn reconcile_enrollments(
    pool: &PgPool,
    user_id: Uuid,
    desired: &[Uuid],
) -> Result<(), ProfileError> {
    let current: Vec<Uuid> =
        sqlx::query_scalar("SELECT module_id FROM module_enrollments WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    let to_remove: Vec<Uuid> = current
        .iter()
        .copied()
        .filter(|id| !desired.contains(id))
        .collect();
    let to_add: Vec<Uuid> = desired
        .iter()
        .copied()
        .filter(|id| !current.contains(id))
        .collect();

    if !to_remove.is_empty() {
        sqlx::query("DELETE FROM module_enrollments WHERE user_id = $1 AND module_id = ANY($2)")
            .bind(user_id)
            .bind(&to_remove)
            .execute(pool)
            .await?;
    }

    if !to_add.is_empty() {
        let mut builder = QueryBuilder::new("INSERT INTO module_enrollments (user_id, module_id) ");
        builder.push_values(&to_add, |mut row, module_id| {
            row.push_bind(user_id).push_bind(module_id);
        });
        builder.build().execute(pool).await.map_err(|e| {
            let fk = e
                .as_database_error()
                .is_some_and(sqlx::error::DatabaseError::is_foreign_key_violation);
            if fk { ProfileError::UnknownModule } else { e.into() }
        })?;
    }

    info!(%user_id, added = to_add.len(), removed = to_remove.len(), "enrollments reconciled");
    Ok(())
}

// =============================================================================
// NARROW EDITS
// =============================================================================

/// Full-profile partial update of the caller's own row.
///
/// # Errors
///
/// Returns a validation error for bad years or skill lists, `NotFound` when
/// the user row is absent, or a database error.
pub async fn edit_profile(
    pool: &PgPool,
    user_id: Uuid,
    edit: ProfileEdit,
) -> Result<UserRecord, ProfileError> {
    let enrollment_year = edit.enrollment_year.map(validate_enrollment_year).transpose()?;
    let hard_skills = edit.hard_skills.as_deref().map(validate_skills).transpose()?;
    let soft_skills = edit.soft_skills.as_deref().map(validate_skills).transpose()?;

    sqlx::query_as::<_, UserTuple>(&format!(
        r"UPDATE users
          SET name = COALESCE($2, name),
              enrollment_year = COALESCE($3, enrollment_year),
              course = COALESCE($4, course),
              image = COALESCE($5, image),
              banner = COALESCE($6, banner),
              intro = COALESCE($7, intro),
              project = COALESCE($8, project),
              interest = COALESCE($9, interest),
              hard_skills = COALESCE($10, hard_skills),
              soft_skills = COALESCE($11, soft_skills)
          WHERE id = $1
          RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(edit.name)
    .bind(enrollment_year)
    .bind(edit.course.map(Course::as_str))
    .bind(edit.image)
    .bind(edit.banner)
    .bind(edit.intro)
    .bind(edit.project)
    .bind(edit.interest)
    .bind(hard_skills.map(Json))
    .bind(soft_skills.map(Json))
    .fetch_optional(pool)
    .await?
    .map(user_from_tuple)
    .ok_or(ProfileError::NotFound(user_id))
}

/// Update name / enrollment year / course.
///
/// # Errors
///
/// Returns `InvalidEnrollmentYear` for out-of-range years, `NotFound` when
/// the user row is absent, or a database error.
pub async fn edit_basic_info(
    pool: &PgPool,
    user_id: Uuid,
    edit: BasicInfoEdit,
) -> Result<UserRecord, ProfileError> {
    let enrollment_year = edit.enrollment_year.map(validate_enrollment_year).transpose()?;

    sqlx::query_as::<_, UserTuple>(&format!(
        r"UPDATE users
          SET name = COALESCE($2, name),
              enrollment_year = COALESCE($3, enrollment_year),
              course = COALESCE($4, course)
          WHERE id = $1
          RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(edit.name)
    .bind(enrollment_year)
    .bind(edit.course.map(Course::as_str))
    .fetch_optional(pool)
    .await?
    .map(user_from_tuple)
    .ok_or(ProfileError::NotFound(user_id))
}

async fn set_skill_column(
    pool: &PgPool,
    user_id: Uuid,
    column: &str,
    skills: Vec<Skill>,
) -> Result<UserRecord, ProfileError> {
    let skills = validate_skills(&skills)?;

    // `column` is one of two compile-time constants, never user input.
    sqlx::query_as::<_, UserTuple>(&format!(
        "UPDATE users SET {column} = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(Json(skills))
    .fetch_optional(pool)
    .await?
    .map(user_from_tuple)
    .ok_or(ProfileError::NotFound(user_id))
}

/// Replace the hard-skill list.
///
/// # Errors
///
/// Returns a skill validation error, `NotFound`, or a database error.
pub async fn edit_hard_skills(
    pool: &PgPool,
    user_id: Uuid,
    skills: Vec<Skill>,
) -> Result<UserRecord, ProfileError> {
    set_skill_column(pool, user_id, "hard_skills", skills).await
}

/// Replace the soft-skill list.
///
/// # Errors
///
/// Returns a skill validation error, `NotFound`, or a database error.
pub async fn edit_soft_skills(
    pool: &PgPool,
    user_id: Uuid,
    skills: Vec<Skill>,
) -> Result<UserRecord, ProfileError> {
    set_skill_column(pool, user_id, "soft_skills", skills).await
}

async fn set_text_column(
    pool: &PgPool,
    user_id: Uuid,
    column: &str,
    value: String,
) -> Result<UserRecord, ProfileError> {
    // `column` is one of three compile-time constants, never user input.
    sqlx::query_as::<_, UserTuple>(&format!(
        "UPDATE users SET {column} = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(value)
    .fetch_optional(pool)
    .await?
    .map(user_from_tuple)
    .ok_or(ProfileError::NotFound(user_id))
}

/// Replace the intro text.
///
/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn edit_intro(pool: &PgPool, user_id: Uuid, intro: String) -> Result<UserRecord, ProfileError> {
    set_text_column(pool, user_id, "intro", intro).await
}

/// Replace the banner reference.
///
/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn edit_banner(pool: &PgPool, user_id: Uuid, banner: String) -> Result<UserRecord, ProfileError> {
    set_text_column(pool, user_id, "banner", banner).await
}

/// Replace the project text.
///
/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn edit_project(pool: &PgPool, user_id: Uuid, project: String) -> Result<UserRecord, ProfileError> {
    set_text_column(pool, user_id, "project", project).await
}

// =============================================================================
// RECOMMENDATIONS
// =============================================================================

/// Recommend peers who share at least one module with the user.
///
/// Returns an empty list when the user has no enrollments. Results carry
/// the shared module list and its count, ordered by overlap descending and
/// then user id ascending, capped at [`RECOMMENDATION_CAP`].
///
/// # Errors
///
/// Returns a database error if a query fails.
pub async fn recommend_peers(pool: &PgPool, user_id: Uuid) -> Result<Vec<PeerMatch>, ProfileError> {
    let module_ids: Vec<Uuid> =
        sqlx::query_scalar("SELECT module_id FROM module_enrollments WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    if module_ids.is_empty() {
        return Ok(Vec::new());
    }

    type PeerTuple = (
        Uuid,
        String,
        Option<String>,
        Option<i32>,
        Option<String>,
        Option<String>,
        Uuid,
        String,
        String,
        String,
    );

    let rows = sqlx::query_as::<_, PeerTuple>(
        r"SELECT u.id, u.name, u.course, u.enrollment_year, u.image, u.intro,
                 m.id, m.name, m.class_id, m.prof
          FROM module_enrollments e
          JOIN users u ON u.id = e.user_id
          JOIN modules m ON m.id = e.module_id
          WHERE e.module_id = ANY($2) AND e.user_id <> $1
          ORDER BY u.id ASC, m.name ASC",
    )
    .bind(user_id)
    .bind(&module_ids)
    .fetch_all(pool)
    .await?;

    let pairs = rows
        .into_iter()
        .map(
            |(id, name, course, enrollment_year, image, intro, m_id, m_name, class_id, prof)| {
                (
                    PeerUser { id, name, course, enrollment_year, image, intro },
                    ModuleRow { id: m_id, name: m_name, class_id, prof },
                )
            },
        )
        .collect();

    Ok(rank_peers(pairs, RECOMMENDATION_CAP))
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
