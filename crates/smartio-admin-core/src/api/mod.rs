//! HTTP access to the SMARTIO backend.
//!
//! This module provides:
//! - `Transport`: the minimal fetch seam both page controllers are written against
//! - `HttpClient`: the `reqwest` implementation of it
//! - `AuthorizedClient`: bearer-attached requests for the rest of the admin API
//!
//! The backend issues tokens from `POST /admin/token` and identifies the
//! caller at `GET /api/admin/me`.

pub mod authorized;
pub mod client;
pub mod error;

pub use authorized::{AuthorizedClient, Fetched};
pub use client::{HttpClient, HttpReply, Transport};
pub use error::ApiError;
