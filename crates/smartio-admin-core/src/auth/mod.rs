//! Authentication module for the admin console session lifecycle.
//!
//! This module provides:
//! - `SessionStore`: the persisted token slot (memory, file, OS keychain)
//! - `LoginController`: login form submission to stored token
//! - `SessionGuard`: protected page identity check and logout
//!
//! Tokens have no local expiry; the backend decides validity on every
//! protected page load.

pub mod guard;
pub mod login;
pub mod store;

pub use guard::{handle_protected_load, GuardOutcome, GuardState, SessionGuard};
pub use login::{handle_login_submit, LoginController, LoginOutcome, LOGIN_FALLBACK_MESSAGE};
pub use store::{FileStore, KeyringStore, MemoryStore, SessionStore, StoreError, StoredEntry};
