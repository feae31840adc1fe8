//! Login page controller.
//!
//! `handle_login_submit` decides what a submission means; `LoginController`
//! applies the decision to storage and the page. Exactly one of two things
//! happens per submission: the token is stored and the page navigates to the
//! dashboard, or the error slot shows a message and the form stays up.

use tracing::{error, info, warn};

use crate::api::{ApiError, Transport};
use crate::config::Config;
use crate::models::{Credential, ErrorBody, TokenResponse};
use crate::page::{ElementId, Page};

use super::store::SessionStore;

/// Shown when the backend rejects a login without a usable `detail`.
pub const LOGIN_FALLBACK_MESSAGE: &str = "Login error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Token issued; store it and go to `redirect`.
    Success { token: String, redirect: String },
    /// Show `message` in the error slot.
    Error { message: String },
}

/// Exchange `credential` for a token. Performs the single network call and
/// nothing else.
pub async fn handle_login_submit<T: Transport>(
    transport: &T,
    config: &Config,
    credential: &Credential,
) -> LoginOutcome {
    let reply = match transport
        .post_form(&config.token_endpoint, &credential.form_fields())
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "Login request failed");
            return e.into();
        }
    };

    if reply.is_success() {
        return match reply.json::<TokenResponse>() {
            Ok(token) => {
                info!(
                    username = %credential.username,
                    token_type = token.token_type.as_deref().unwrap_or("unknown"),
                    "Login accepted"
                );
                LoginOutcome::Success {
                    token: token.access_token,
                    redirect: config.dashboard_path.clone(),
                }
            }
            Err(e) => {
                error!(error = %e, "Unreadable token response");
                e.into()
            }
        };
    }

    match reply.json::<ErrorBody>() {
        Ok(body) => {
            let message = body
                .message()
                .unwrap_or_else(|| LOGIN_FALLBACK_MESSAGE.to_string());
            warn!(status = reply.status, message = %message, "Login rejected");
            LoginOutcome::Error { message }
        }
        Err(e) => {
            error!(status = reply.status, error = %e, "Unreadable login error response");
            e.into()
        }
    }
}

/// Handles submissions of the admin login form.
pub struct LoginController<'a, T, S> {
    transport: &'a T,
    store: S,
    config: &'a Config,
}

impl<'a, T: Transport, S: SessionStore> LoginController<'a, T, S> {
    pub fn new(transport: &'a T, store: S, config: &'a Config) -> Self {
        Self {
            transport,
            store,
            config,
        }
    }

    /// Whether `page` is a login page this controller should attach to.
    pub fn attaches_to<P: Page>(page: &P) -> bool {
        page.has_element(ElementId::LoginForm)
    }

    /// Handle one form submission. Fields are read verbatim from the page.
    ///
    /// The returned outcome reflects what was applied: a token that could
    /// not be persisted turns into an error.
    pub async fn submit<P: Page>(&self, page: &mut P) -> LoginOutcome {
        let credential = Credential::new(
            page.field_value(ElementId::Username),
            page.field_value(ElementId::Password),
        );

        let outcome = handle_login_submit(self.transport, self.config, &credential).await;
        self.apply(page, outcome)
    }

    fn apply<P: Page>(&self, page: &mut P, outcome: LoginOutcome) -> LoginOutcome {
        match outcome {
            LoginOutcome::Success { token, redirect } => {
                if let Err(e) = self.store.set(&self.config.storage_key, &token) {
                    error!(error = %e, "Failed to persist token");
                    let message = e.to_string();
                    page.show_error(&message);
                    return LoginOutcome::Error { message };
                }
                page.navigate(&redirect);
                LoginOutcome::Success { token, redirect }
            }
            LoginOutcome::Error { message } => {
                page.show_error(&message);
                LoginOutcome::Error { message }
            }
        }
    }
}

impl From<ApiError> for LoginOutcome {
    fn from(e: ApiError) -> Self {
        LoginOutcome::Error {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HttpReply;
    use crate::auth::store::{FileStore, MemoryStore};
    use crate::testing::{Call, RecordingPage, Scripted, ScriptedTransport};

    const KEY: &str = "admin_access_token";

    #[tokio::test]
    async fn test_submit_success_stores_token_and_navigates() {
        let config = Config::default();
        let transport =
            ScriptedTransport::replying(200, r#"{"access_token": "T", "token_type": "bearer"}"#);
        let store = MemoryStore::new();
        let mut page = RecordingPage::login("alice", "secret");

        let outcome = LoginController::new(&transport, &store, &config)
            .submit(&mut page)
            .await;

        assert_eq!(
            outcome,
            LoginOutcome::Success {
                token: "T".to_string(),
                redirect: "/admin".to_string()
            }
        );
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("T"));
        assert_eq!(page.navigations, vec!["/admin".to_string()]);
        assert_eq!(page.error_shown(), None);
        assert_eq!(page.after_navigation, 0);
    }

    #[tokio::test]
    async fn test_submit_sends_form_fields_verbatim() {
        let config = Config::default();
        let transport = ScriptedTransport::replying(200, r#"{"access_token": "T"}"#);
        let store = MemoryStore::new();
        let mut page = RecordingPage::login("", " p@ss word ");

        LoginController::new(&transport, &store, &config)
            .submit(&mut page)
            .await;

        assert_eq!(
            transport.calls(),
            vec![Call::PostForm {
                path: "/admin/token".to_string(),
                fields: vec![
                    ("username".to_string(), String::new()),
                    ("password".to_string(), " p@ss word ".to_string()),
                ],
            }]
        );
    }

    #[tokio::test]
    async fn test_submit_rejected_shows_detail() {
        let config = Config::default();
        let transport =
            ScriptedTransport::replying(401, r#"{"detail": "Incorrect username or password"}"#);
        let store = MemoryStore::new();
        let mut page = RecordingPage::login("alice", "wrong");

        let outcome = LoginController::new(&transport, &store, &config)
            .submit(&mut page)
            .await;

        assert_eq!(
            outcome,
            LoginOutcome::Error {
                message: "Incorrect username or password".to_string()
            }
        );
        assert_eq!(page.error_shown(), Some("Incorrect username or password"));
        assert!(page.navigations.is_empty());
        assert_eq!(store.get(KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_submit_rejected_without_detail_uses_fallback() {
        for body in ["{}", r#"{"detail": null}"#, r#"{"detail": ""}"#] {
            let config = Config::default();
            let transport = ScriptedTransport::replying(500, body);
            let store = MemoryStore::new();
            let mut page = RecordingPage::login("alice", "pw");

            LoginController::new(&transport, &store, &config)
                .submit(&mut page)
                .await;

            assert_eq!(page.error_shown(), Some(LOGIN_FALLBACK_MESSAGE), "body: {}", body);
            assert!(page.navigations.is_empty());
            assert_eq!(store.get(KEY).unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_submit_network_failure_shows_error_message() {
        let config = Config::default();
        let transport = ScriptedTransport::failing("connection refused");
        let store = MemoryStore::new();
        let mut page = RecordingPage::login("alice", "pw");

        LoginController::new(&transport, &store, &config)
            .submit(&mut page)
            .await;

        assert_eq!(page.error_shown(), Some("Connection failed: connection refused"));
        assert!(page.navigations.is_empty());
        assert_eq!(store.get(KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_submit_malformed_error_body_shows_parse_error() {
        let config = Config::default();
        let transport = ScriptedTransport::replying(502, "<html>Bad Gateway</html>");
        let store = MemoryStore::new();
        let mut page = RecordingPage::login("alice", "pw");

        let outcome = LoginController::new(&transport, &store, &config)
            .submit(&mut page)
            .await;

        match outcome {
            LoginOutcome::Error { message } => {
                assert!(message.starts_with("Invalid response"), "{}", message);
                assert_eq!(page.error_shown(), Some(message.as_str()));
            }
            other => panic!("expected error, got {:?}", other),
        }
        assert!(page.navigations.is_empty());
    }

    #[tokio::test]
    async fn test_submit_success_without_token_field_is_an_error() {
        let config = Config::default();
        let transport = ScriptedTransport::replying(200, r#"{"token_type": "bearer"}"#);
        let store = MemoryStore::new();
        let mut page = RecordingPage::login("alice", "pw");

        let outcome = LoginController::new(&transport, &store, &config)
            .submit(&mut page)
            .await;

        assert!(matches!(outcome, LoginOutcome::Error { .. }));
        assert!(page.error_shown().is_some());
        assert!(page.navigations.is_empty());
        assert_eq!(store.get(KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_submit_success_over_corrupt_token_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("storage.json"), "{truncated").unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let config = Config::default();
        let transport = ScriptedTransport::replying(200, r#"{"access_token": "T"}"#);
        let mut page = RecordingPage::login("alice", "pw");

        let outcome = LoginController::new(&transport, &store, &config)
            .submit(&mut page)
            .await;

        assert!(matches!(outcome, LoginOutcome::Success { .. }));
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("T"));
        assert_eq!(page.navigations, vec!["/admin".to_string()]);
        assert_eq!(page.error_shown(), None);
    }

    #[tokio::test]
    async fn test_resubmit_after_failure_succeeds() {
        let config = Config::default();
        let transport = ScriptedTransport::new();
        transport.push(Scripted::Reply(HttpReply::new(401, r#"{"detail": "nope"}"#)));
        transport.push(Scripted::Reply(HttpReply::new(200, r#"{"access_token": "T2"}"#)));
        let store = MemoryStore::new();
        let controller = LoginController::new(&transport, &store, &config);
        let mut page = RecordingPage::login("alice", "pw");

        controller.submit(&mut page).await;
        assert_eq!(page.error_shown(), Some("nope"));

        controller.submit(&mut page).await;
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("T2"));
        assert_eq!(page.navigations, vec!["/admin".to_string()]);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_decision_has_no_side_effects() {
        let config = Config::default();
        let transport = ScriptedTransport::replying(200, r#"{"access_token": "T"}"#);
        let outcome =
            handle_login_submit(&transport, &config, &Credential::new("alice", "pw")).await;
        assert!(matches!(outcome, LoginOutcome::Success { ref token, .. } if token == "T"));
    }

    #[test]
    fn test_attaches_only_to_login_page() {
        assert!(LoginController::<ScriptedTransport, MemoryStore>::attaches_to(
            &RecordingPage::login("", "")
        ));
        assert!(!LoginController::<ScriptedTransport, MemoryStore>::attaches_to(
            &RecordingPage::dashboard()
        ));
    }

    #[test]
    fn test_api_error_converts_to_outcome() {
        let outcome: LoginOutcome = ApiError::ServerError("boom".to_string()).into();
        assert_eq!(
            outcome,
            LoginOutcome::Error {
                message: "Server error: boom".to_string()
            }
        );
    }
}
