//! Bearer-attached requests for the rest of the admin API.
//!
//! Every call reads the token slot fresh. A 401 purges the slot and turns
//! into a login redirect, the same as on a protected page load. Other
//! failures are returned as errors and leave the token alone.

use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::auth::SessionStore;
use crate::config::Config;

use super::{ApiError, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<R> {
    Data(R),
    /// The session is gone; navigate to `path`.
    Redirect { path: String },
}

pub struct AuthorizedClient<'a, T, S> {
    transport: &'a T,
    store: S,
    config: &'a Config,
}

impl<'a, T: Transport, S: SessionStore> AuthorizedClient<'a, T, S> {
    pub fn new(transport: &'a T, store: S, config: &'a Config) -> Self {
        Self {
            transport,
            store,
            config,
        }
    }

    fn login_redirect<R>(&self) -> Fetched<R> {
        Fetched::Redirect {
            path: self.config.login_path.clone(),
        }
    }

    /// GET `path` as the signed-in administrator and parse the JSON body.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<Fetched<R>, ApiError> {
        let token = self.store.get(&self.config.storage_key)?;
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            debug!(path, "No stored token, skipping request");
            return Ok(self.login_redirect());
        };

        let reply = self.transport.get_with_bearer(path, &token).await?;

        if reply.is_unauthorized() {
            info!(path, "Token rejected, clearing session");
            if let Err(e) = self.store.clear(&self.config.storage_key) {
                error!(error = %e, "Failed to clear stored token");
            }
            return Ok(self.login_redirect());
        }

        if !reply.is_success() {
            return Err(ApiError::from_status(reply.status, &reply.body));
        }

        Ok(Fetched::Data(reply.json()?))
    }
}
