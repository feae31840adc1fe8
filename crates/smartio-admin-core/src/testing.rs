//! Test doubles: a scripted transport, a recording page and a store that
//! refuses writes.
//!
//! Compiled for this crate's unit tests and, with the `testing` feature, for
//! hosts that want to drive the controllers without a network.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::Mutex;

use crate::api::{ApiError, HttpReply, Transport};
use crate::auth::{SessionStore, StoreError};
use crate::page::{ElementId, Page};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    PostForm {
        path: String,
        fields: Vec<(String, String)>,
    },
    GetWithBearer {
        path: String,
        token: String,
    },
}

pub enum Scripted {
    Reply(HttpReply),
    ConnectionFailed(&'static str),
}

/// Answers requests from a queue and records what was asked.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(status: u16, body: &str) -> Self {
        let transport = Self::new();
        transport.push(Scripted::Reply(HttpReply::new(status, body)));
        transport
    }

    pub fn failing(message: &'static str) -> Self {
        let transport = Self::new();
        transport.push(Scripted::ConnectionFailed(message));
        transport
    }

    pub fn push(&self, scripted: Scripted) {
        self.replies.lock().unwrap().push_back(scripted);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, call: Call) -> Result<HttpReply, ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.replies.lock().unwrap().pop_front() {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::ConnectionFailed(message)) => {
                Err(ApiError::ConnectionFailed(message.to_string()))
            }
            None => panic!("unexpected request, nothing scripted"),
        }
    }
}

impl Transport for ScriptedTransport {
    async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<HttpReply, ApiError> {
        self.next(Call::PostForm {
            path: path.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    async fn get_with_bearer(&self, path: &str, token: &str) -> Result<HttpReply, ApiError> {
        self.next(Call::GetWithBearer {
            path: path.to_string(),
            token: token.to_string(),
        })
    }
}

/// In-memory page that records every mutation.
#[derive(Debug, Default)]
pub struct RecordingPage {
    elements: HashSet<ElementId>,
    fields: HashMap<ElementId, String>,
    pub texts: HashMap<ElementId, String>,
    pub visible: HashMap<ElementId, bool>,
    pub navigations: Vec<String>,
    /// Mutations made after a navigation; should stay empty.
    pub after_navigation: usize,
}

impl RecordingPage {
    pub fn login(username: &str, password: &str) -> Self {
        let mut page = Self::default();
        page.elements.extend([
            ElementId::LoginForm,
            ElementId::Username,
            ElementId::Password,
            ElementId::ErrorMessage,
        ]);
        page.fields.insert(ElementId::Username, username.to_string());
        page.fields.insert(ElementId::Password, password.to_string());
        page.visible.insert(ElementId::ErrorMessage, false);
        page
    }

    pub fn dashboard() -> Self {
        let mut page = Self::default();
        page.elements
            .extend([ElementId::AdminUsername, ElementId::LogoutButton]);
        page
    }

    pub fn error_shown(&self) -> Option<&str> {
        match self.visible.get(&ElementId::ErrorMessage) {
            Some(true) => self.texts.get(&ElementId::ErrorMessage).map(String::as_str),
            _ => None,
        }
    }

    fn touch(&mut self) {
        if !self.navigations.is_empty() {
            self.after_navigation += 1;
        }
    }
}

impl Page for RecordingPage {
    fn has_element(&self, id: ElementId) -> bool {
        self.elements.contains(&id)
    }

    fn field_value(&self, id: ElementId) -> String {
        self.fields.get(&id).cloned().unwrap_or_default()
    }

    fn set_text(&mut self, id: ElementId, text: &str) {
        self.touch();
        self.texts.insert(id, text.to_string());
    }

    fn set_visible(&mut self, id: ElementId, visible: bool) {
        self.touch();
        self.visible.insert(id, visible);
    }

    fn navigate(&mut self, path: &str) {
        self.touch();
        self.navigations.push(path.to_string());
    }
}

/// Store whose contents can be read but never changed, like a token file on
/// a read-only mount.
#[derive(Debug, Default)]
pub struct ReadOnlyStore {
    token: Option<String>,
}

impl ReadOnlyStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }

    fn denied() -> StoreError {
        StoreError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "store is read-only",
        ))
    }
}

impl SessionStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.token.clone())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(Self::denied())
    }

    fn clear(&self, _key: &str) -> Result<(), StoreError> {
        Err(Self::denied())
    }
}
