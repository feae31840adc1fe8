//! Protected page guard.
//!
//! On every load of a page carrying the identity placeholder the guard reads
//! the stored token, asks the backend who it belongs to, and either renders
//! the identity or purges the token and sends the browser to the login page.
//! Failures are never shown on the page; they are logged and end in a
//! redirect.
//!
//! ```text
//! Unchecked -> Unauthenticated                      (no token: redirect)
//! Unchecked -> Checking -> Authenticated            (2xx: render identity)
//!                       -> Rejected                 (401: purge, redirect)
//!                       -> Failed                   (anything else: purge, redirect)
//! ```

use tracing::{debug, error, info, warn};

use crate::api::{ApiError, Transport};
use crate::config::Config;
use crate::models::IdentityView;
use crate::page::{ElementId, Page};

use super::store::{SessionStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unchecked,
    Unauthenticated,
    Checking,
    Authenticated,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Token accepted; render `identity`.
    Authenticated { identity: IdentityView },
    /// No token stored; nothing was sent.
    Unauthenticated { redirect: String },
    /// Backend answered 401.
    Rejected { redirect: String },
    /// Any other failure to confirm the identity.
    Error { message: String, redirect: String },
}

impl GuardOutcome {
    pub fn state(&self) -> GuardState {
        match self {
            GuardOutcome::Authenticated { .. } => GuardState::Authenticated,
            GuardOutcome::Unauthenticated { .. } => GuardState::Unauthenticated,
            GuardOutcome::Rejected { .. } => GuardState::Rejected,
            GuardOutcome::Error { .. } => GuardState::Failed,
        }
    }

    pub fn redirect(&self) -> Option<&str> {
        match self {
            GuardOutcome::Authenticated { .. } => None,
            GuardOutcome::Unauthenticated { redirect }
            | GuardOutcome::Rejected { redirect }
            | GuardOutcome::Error { redirect, .. } => Some(redirect),
        }
    }

    /// Whether the stored token must be purged before redirecting.
    pub fn clears_token(&self) -> bool {
        matches!(
            self,
            GuardOutcome::Rejected { .. } | GuardOutcome::Error { .. }
        )
    }
}

/// Decide what a protected page load means for `token`.
///
/// Issues at most one identity request, and none when `token` is `None` or
/// empty.
pub async fn handle_protected_load<T: Transport>(
    transport: &T,
    config: &Config,
    token: Option<&str>,
) -> GuardOutcome {
    let redirect = config.login_path.clone();

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        debug!("No stored token");
        return GuardOutcome::Unauthenticated { redirect };
    };

    let reply = match transport
        .get_with_bearer(&config.identity_endpoint, token)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "Identity request failed");
            return GuardOutcome::Error {
                message: e.to_string(),
                redirect,
            };
        }
    };

    if reply.is_unauthorized() {
        info!("Stored token rejected");
        return GuardOutcome::Rejected { redirect };
    }

    if !reply.is_success() {
        let e = ApiError::from_status(reply.status, &reply.body);
        error!(status = reply.status, error = %e, "Identity check failed");
        return GuardOutcome::Error {
            message: e.to_string(),
            redirect,
        };
    }

    match reply.json::<IdentityView>() {
        Ok(identity) => {
            debug!(username = %identity.username, "Identity confirmed");
            GuardOutcome::Authenticated { identity }
        }
        Err(e) => {
            error!(error = %e, "Unreadable identity response");
            GuardOutcome::Error {
                message: e.to_string(),
                redirect,
            }
        }
    }
}

/// Guards one protected page instance.
pub struct SessionGuard<'a, T, S> {
    transport: &'a T,
    store: S,
    config: &'a Config,
    state: GuardState,
}

impl<'a, T: Transport, S: SessionStore> SessionGuard<'a, T, S> {
    pub fn new(transport: &'a T, store: S, config: &'a Config) -> Self {
        Self {
            transport,
            store,
            config,
            state: GuardState::Unchecked,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Whether `page` is protected. Pages without the identity placeholder
    /// are left alone.
    pub fn attaches_to<P: Page>(page: &P) -> bool {
        page.has_element(ElementId::AdminUsername)
    }

    /// Whether `page` offers a logout control to bind.
    pub fn has_logout_control<P: Page>(page: &P) -> bool {
        page.has_element(ElementId::LogoutButton)
    }

    fn transition(&mut self, next: GuardState) {
        debug!(from = ?self.state, to = ?next, "Guard transition");
        self.state = next;
    }

    /// Run the page-load check. Returns `None` when `page` is not protected.
    pub async fn on_load<P: Page>(&mut self, page: &mut P) -> Option<GuardOutcome> {
        if !Self::attaches_to(page) {
            return None;
        }

        let token = match self.store.get(&self.config.storage_key) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read stored token, treating as absent");
                None
            }
        };

        if token.as_deref().is_some_and(|t| !t.is_empty()) {
            self.transition(GuardState::Checking);
        }

        let outcome = handle_protected_load(self.transport, self.config, token.as_deref()).await;
        self.apply(page, &outcome);
        Some(outcome)
    }

    fn apply<P: Page>(&mut self, page: &mut P, outcome: &GuardOutcome) {
        self.transition(outcome.state());

        if let GuardOutcome::Authenticated { identity } = outcome {
            page.set_text(ElementId::AdminUsername, identity.display_name());
            return;
        }

        if outcome.clears_token() {
            // Logged in purge; the redirect happens regardless.
            let _ = self.purge();
        }
        if let Some(path) = outcome.redirect() {
            page.navigate(path);
        }
    }

    fn purge(&self) -> Result<(), StoreError> {
        let result = self.store.clear(&self.config.storage_key);
        if let Err(ref e) = result {
            error!(error = %e, "Failed to clear stored token");
        }
        result
    }

    /// Logout click: drop the token and go to the login page, whatever the
    /// current state.
    ///
    /// The page always navigates. The result tells the host whether the
    /// token is actually gone.
    pub fn on_logout_click<P: Page>(&mut self, page: &mut P) -> Result<(), StoreError> {
        info!("Logging out");
        let purged = self.purge();
        self.transition(GuardState::Unauthenticated);
        page.navigate(&self.config.login_path);
        purged
    }
}
