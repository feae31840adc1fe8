//! The page surface the controllers act on.
//!
//! A host (browser bridge, terminal, test double) implements `Page`; the
//! controllers only look elements up by their stable ids, read form fields,
//! set text, toggle visibility and navigate.

/// Elements of the console pages, keyed by their DOM ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    LoginForm,
    Username,
    Password,
    ErrorMessage,
    LogoutButton,
    /// Identity placeholder; its presence marks a protected page.
    AdminUsername,
}

impl ElementId {
    pub fn dom_id(self) -> &'static str {
        match self {
            ElementId::LoginForm => "adminLoginForm",
            ElementId::Username => "username",
            ElementId::Password => "password",
            ElementId::ErrorMessage => "errorMessage",
            ElementId::LogoutButton => "logoutButton",
            ElementId::AdminUsername => "adminUsername",
        }
    }
}

pub trait Page {
    fn has_element(&self, id: ElementId) -> bool;

    /// Current value of a form field, empty when the field is missing.
    fn field_value(&self, id: ElementId) -> String;

    fn set_text(&mut self, id: ElementId, text: &str);

    /// Add or remove the `hidden` class.
    fn set_visible(&mut self, id: ElementId, visible: bool);

    /// Full navigation. Callers treat this as the last effect of a handler.
    fn navigate(&mut self, path: &str);

    /// Put `message` in the error slot and reveal it.
    fn show_error(&mut self, message: &str) {
        self.set_text(ElementId::ErrorMessage, message);
        self.set_visible(ElementId::ErrorMessage, true);
    }
}
