//! Page router for the terminal host.
//!
//! Mirrors a browser tab: each navigation loads exactly one page, each page
//! runs its controller to completion, and the path the page navigated to (if
//! any) decides what loads next.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use smartio_admin_core::{
    Config, Credential, GuardOutcome, LoginController, SessionGuard, SessionStore, Transport,
};
use tracing::debug;

use crate::page::TerminalPage;

/// How a page visit ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// The page navigated to `path`.
    Navigated(String),
    /// The page stayed put (identity rendered, or the user quit).
    Stayed,
}

/// Source of what gets typed into the login form.
pub trait Prompt {
    /// Next username and password, offering `default` as the username.
    /// `None` means the user quit the form.
    fn credentials(&mut self, default: Option<&str>) -> Result<Option<Credential>>;
}

/// Reads the username from stdin and the password without echo.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn credentials(&mut self, default: Option<&str>) -> Result<Option<Credential>> {
        let Some(username) = prompt_username(default)? else {
            return Ok(None);
        };
        let password =
            rpassword::prompt_password("Password: ").context("Failed to read password")?;
        Ok(Some(Credential::new(username, password)))
    }
}

pub struct Console<'a, T, S, P = TerminalPrompt> {
    transport: &'a T,
    store: S,
    config: &'a Config,
    prompt: P,
    default_username: Option<String>,
    /// Follow a redirect from the dashboard to the login page.
    follow_to_login: bool,
}

impl<'a, T: Transport, S: SessionStore + Copy> Console<'a, T, S> {
    pub fn new(transport: &'a T, store: S, config: &'a Config) -> Self {
        Self {
            transport,
            store,
            config,
            prompt: TerminalPrompt,
            default_username: None,
            follow_to_login: true,
        }
    }
}

impl<'a, T: Transport, S: SessionStore + Copy, P: Prompt> Console<'a, T, S, P> {
    pub fn with_prompt<Q: Prompt>(self, prompt: Q) -> Console<'a, T, S, Q> {
        Console {
            transport: self.transport,
            store: self.store,
            config: self.config,
            prompt,
            default_username: self.default_username,
            follow_to_login: self.follow_to_login,
        }
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.default_username = username;
        self
    }

    pub fn follow_to_login(mut self, follow: bool) -> Self {
        self.follow_to_login = follow;
        self
    }

    /// Load `path` and keep following navigations until a page stays put.
    pub async fn run(&mut self, path: &str) -> Result<Visit> {
        let mut path = path.to_string();
        loop {
            debug!(path = %path, "Loading page");
            let visit = if self.config.is_login_path(&path) {
                self.login_page().await?
            } else if self.config.is_dashboard_path(&path) {
                self.dashboard_page().await?
            } else {
                bail!("No page at {}", path);
            };

            match visit {
                Visit::Navigated(next) => {
                    if self.config.is_login_path(&next) && !self.follow_to_login {
                        return Ok(Visit::Navigated(next));
                    }
                    path = next;
                }
                Visit::Stayed => return Ok(Visit::Stayed),
            }
        }
    }

    /// The login form: prompt, submit, and re-prompt while the error slot is
    /// showing. Quitting at the prompt stays on the page.
    async fn login_page(&mut self) -> Result<Visit> {
        let controller = LoginController::new(self.transport, self.store, self.config);
        loop {
            let Some(credential) = self.prompt.credentials(self.default_username.as_deref())?
            else {
                return Ok(Visit::Stayed);
            };

            let mut page = TerminalPage::login(credential.username, credential.password);
            controller.submit(&mut page).await;

            if let Some(next) = page.location {
                return Ok(Visit::Navigated(next));
            }
        }
    }

    /// A protected page: the guard check, then stop.
    async fn dashboard_page(&self) -> Result<Visit> {
        let mut guard = SessionGuard::new(self.transport, self.store, self.config);
        let mut page = TerminalPage::dashboard();

        match guard.on_load(&mut page).await {
            Some(GuardOutcome::Authenticated { .. }) => Ok(Visit::Stayed),
            _ => match page.location {
                Some(next) => Ok(Visit::Navigated(next)),
                None => Ok(Visit::Stayed),
            },
        }
    }

    /// Click the dashboard's logout control. Fails when the token could not
    /// be removed, even though the page has already moved to the login form.
    pub fn logout(&self) -> Result<Visit> {
        let mut guard = SessionGuard::new(self.transport, self.store, self.config);
        let mut page = TerminalPage::dashboard();
        guard
            .on_logout_click(&mut page)
            .context("Token is still stored")?;
        Ok(match page.location {
            Some(next) => Visit::Navigated(next),
            None => Visit::Stayed,
        })
    }
}

/// Ask for a username, offering `default` on Enter. `None` means quit.
fn prompt_username(default: Option<&str>) -> Result<Option<String>> {
    let mut stdout = io::stdout();
    match default {
        Some(name) => write!(stdout, "Username [{}]: ", name)?,
        None => write!(stdout, "Username (empty to quit): ")?,
    }
    stdout.flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }

    let typed = line.trim_end_matches(['\r', '\n']);
    Ok(match (typed.is_empty(), default) {
        (false, _) => Some(typed.to_string()),
        (true, Some(name)) => Some(name.to_string()),
        (true, None) => None,
    })
}
