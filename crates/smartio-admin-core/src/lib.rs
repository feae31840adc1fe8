//! Session lifecycle for the SMARTIO admin console.
//!
//! Two page controllers share a single persisted bearer token:
//!
//! - `LoginController` turns a login form submission into a stored token
//!   (and a navigation to the dashboard) or a visible error message.
//! - `SessionGuard` validates the stored token on protected pages by fetching
//!   the current identity, renders it, and owns logout.
//!
//! The controllers never talk to each other. They only meet at the
//! `SessionStore` slot named by `Config::storage_key`.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod page;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::{ApiError, AuthorizedClient, Fetched, HttpClient, HttpReply, Transport};
pub use auth::{
    handle_login_submit, handle_protected_load, FileStore, GuardOutcome, GuardState,
    KeyringStore, LoginController, LoginOutcome, MemoryStore, SessionGuard, SessionStore,
    StoreError,
};
pub use config::Config;
pub use models::{Credential, IdentityView};
pub use page::{ElementId, Page};
