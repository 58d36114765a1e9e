//! Validation state shared by every input of a checkout session.
//!
//! The [`Registry`] maps each field to its current error. Fields write into it
//! through [`Field`], the checkout processor only asks whether any error is
//! registered at all.

use {
    crate::infra::observe,
    std::{collections::BTreeMap, sync::Arc},
    tokio::sync::watch,
};

pub mod field;

pub use field::{Field, Input, TextInput};

/// Identifies the field an error belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub String);

impl FieldId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for FieldId {
    fn from(inner: String) -> Self {
        Self(inner)
    }
}

impl From<&str> for FieldId {
    fn from(inner: &str) -> Self {
        Self(inner.to_owned())
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error currently registered for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    /// Hidden errors still block the checkout, they are just not rendered
    /// yet.
    pub hidden: bool,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, hidden: bool) -> Self {
        Self {
            message: message.into(),
            hidden,
        }
    }
}

pub type Errors = BTreeMap<FieldId, ValidationError>;

/// Session-wide validation errors, keyed by field. Cloning the registry
/// yields another handle to the same errors.
#[derive(Debug, Clone)]
pub struct Registry {
    errors: Arc<watch::Sender<Errors>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            errors: Arc::new(watch::Sender::new(Errors::new())),
        }
    }

    pub fn get(&self, field: &FieldId) -> Option<ValidationError> {
        self.errors.borrow().get(field).cloned()
    }

    /// Registers the given errors, replacing any error already registered
    /// for the same field.
    pub fn set_errors(&self, errors: impl IntoIterator<Item = (FieldId, ValidationError)>) {
        let errors: Vec<_> = errors.into_iter().collect();
        self.errors.send_if_modified(|current| {
            let mut modified = false;
            for (field, error) in errors {
                observe::validation_error_set(&field, &error);
                if current.get(&field) != Some(&error) {
                    current.insert(field, error);
                    modified = true;
                }
            }
            modified
        });
    }

    pub fn clear(&self, field: &FieldId) {
        self.errors
            .send_if_modified(|current| current.remove(field).is_some());
    }

    pub fn clear_all(&self) {
        self.errors.send_if_modified(|current| {
            let modified = !current.is_empty();
            current.clear();
            modified
        });
    }

    /// Marks the error of `field` as hidden without removing it.
    pub fn hide(&self, field: &FieldId) {
        self.errors
            .send_if_modified(|current| match current.get_mut(field) {
                Some(error) if !error.hidden => {
                    error.hidden = true;
                    true
                }
                _ => false,
            });
    }

    /// Reveals every registered error.
    pub fn show_all(&self) {
        self.errors.send_if_modified(|current| {
            let mut modified = false;
            for error in current.values_mut().filter(|error| error.hidden) {
                error.hidden = false;
                modified = true;
            }
            modified
        });
    }

    /// Whether any error is registered, hidden ones included.
    pub fn has_errors(&self) -> bool {
        !self.errors.borrow().is_empty()
    }

    /// The id of the element rendering the error of `field`. Only available
    /// while that error exists and is visible.
    pub fn error_element_id(&self, field: &FieldId) -> Option<String> {
        self.errors
            .borrow()
            .get(field)
            .filter(|error| !error.hidden)
            .map(|_| format!("validate-error-{field}"))
    }

    pub fn errors(&self) -> Errors {
        self.errors.borrow().clone()
    }

    /// Notifies the receiver whenever the registered errors change.
    pub fn subscribe(&self) -> watch::Receiver<Errors> {
        self.errors.subscribe()
    }
}
