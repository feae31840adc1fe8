//! Terminal rendition of the console pages.

use std::collections::{HashMap, HashSet};

use smartio_admin_core::{ElementId, Page};
use tracing::debug;

/// A page shown in the terminal. Text written to the identity placeholder
/// and the error slot is printed; navigation is recorded for the router.
#[derive(Debug, Default)]
pub struct TerminalPage {
    elements: HashSet<ElementId>,
    fields: HashMap<ElementId, String>,
    error_text: String,
    pub identity: Option<String>,
    pub location: Option<String>,
}

impl TerminalPage {
    pub fn login(username: String, password: String) -> Self {
        let mut page = Self::default();
        page.elements.extend([
            ElementId::LoginForm,
            ElementId::Username,
            ElementId::Password,
            ElementId::ErrorMessage,
        ]);
        page.fields.insert(ElementId::Username, username);
        page.fields.insert(ElementId::Password, password);
        page
    }

    pub fn dashboard() -> Self {
        let mut page = Self::default();
        page.elements
            .extend([ElementId::AdminUsername, ElementId::LogoutButton]);
        page
    }
}

impl Page for TerminalPage {
    fn has_element(&self, id: ElementId) -> bool {
        self.elements.contains(&id)
    }

    fn field_value(&self, id: ElementId) -> String {
        self.fields.get(&id).cloned().unwrap_or_default()
    }

    fn set_text(&mut self, id: ElementId, text: &str) {
        match id {
            ElementId::AdminUsername => {
                println!("Signed in as {}", text);
                self.identity = Some(text.to_string());
            }
            ElementId::ErrorMessage => self.error_text = text.to_string(),
            _ => debug!(element = id.dom_id(), "Text set on unrendered element"),
        }
    }

    fn set_visible(&mut self, id: ElementId, visible: bool) {
        if id == ElementId::ErrorMessage && visible {
            eprintln!("✗ {}", self.error_text);
        }
    }

    fn navigate(&mut self, path: &str) {
        debug!(path, "Navigate");
        self.location = Some(path.to_string());
    }
}
