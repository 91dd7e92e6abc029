//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and auth plumbing.
//! Each operation is a self-contained unit of work: it runs to completion
//! against the pool and returns a result or a typed failure.

pub mod forum;
pub mod module;
pub mod profile;
pub mod search;
pub mod session;
