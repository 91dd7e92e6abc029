//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One HTTP route per user action, grouped by resource: `auth`, `modules`,
//! `forums`, `users`. The presentation layer is an external collaborator;
//! this router is the whole boundary surface.

pub mod auth;
pub mod forums;
pub mod modules;
pub mod users;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/modules", get(modules::list_all).post(modules::create))
        .route("/api/modules/search", get(modules::search))
        .route("/api/modules/mine", get(modules::list_mine))
        .route("/api/modules/enroll-many", post(modules::enroll_many))
        .route("/api/modules/{id}", get(modules::get_one))
        .route(
            "/api/modules/{id}/enroll",
            post(modules::enroll).delete(modules::unenroll),
        )
        .route("/api/forums", get(forums::list_all).post(forums::create))
        .route("/api/forums/search", get(forums::search))
        .route("/api/forums/tagged", get(forums::list_tagged))
        .route(
            "/api/forums/{id}",
            patch(forums::edit).delete(forums::delete),
        )
        .route("/api/forums/{id}/like", post(forums::like))
        .route("/api/forums/{id}/share", post(forums::share))
        .route("/api/users/me", get(users::me))
        .route("/api/users/me/onboarded", get(users::onboarded))
        .route("/api/users/me/onboarding", post(users::onboard))
        .route("/api/users/me/profile", patch(users::edit_profile))
        .route("/api/users/me/basic-info", patch(users::edit_basic_info))
        .route("/api/users/me/hard-skills", put(users::edit_hard_skills))
        .route("/api/users/me/soft-skills", put(users::edit_soft_skills))
        .route("/api/users/me/intro", put(users::edit_intro))
        .route("/api/users/me/banner", put(users::edit_banner))
        .route("/api/users/me/project", put(users::edit_project))
        .route("/api/users/me/recommendations", get(users::recommendations))
        .route("/api/users/{id}", get(users::get_one))
        .route("/api/users/{id}/card", get(users::card))
        .route("/api/users/{id}/share-card", get(users::share_card))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
