use std::sync::{Mutex, PoisonError};

/// Notice id of the general checkout error.
pub const CHECKOUT: &str = "checkout";

/// The notice display of the storefront.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
pub trait Notices: Send + Sync + 'static {
    /// Shows an error. A notice with the same id is replaced.
    fn add_error_notice(&self, message: &str, id: &str);
    fn remove_notice(&self, id: &str);
    /// Suppressed notices are kept but not displayed.
    fn set_is_suppressed(&self, suppressed: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: String,
    pub message: String,
}

/// Notices kept in memory, in the order they were added.
#[derive(Debug, Default)]
pub struct Board {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    notices: Vec<Notice>,
    suppressed: bool,
}

impl Board {
    fn inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.inner().notices.clone()
    }

    /// The notices a customer would see right now.
    pub fn visible(&self) -> Vec<Notice> {
        let inner = self.inner();
        if inner.suppressed {
            return Vec::new();
        }
        inner.notices.clone()
    }

    pub fn get(&self, id: &str) -> Option<Notice> {
        self.inner()
            .notices
            .iter()
            .find(|notice| notice.id == id)
            .cloned()
    }

    pub fn is_suppressed(&self) -> bool {
        self.inner().suppressed
    }
}

impl Notices for Board {
    fn add_error_notice(&self, message: &str, id: &str) {
        tracing::debug!(%id, %message, "error notice");
        let mut inner = self.inner();
        inner.notices.retain(|notice| notice.id != id);
        inner.notices.push(Notice {
            id: id.to_owned(),
            message: message.to_owned(),
        });
    }

    fn remove_notice(&self, id: &str) {
        self.inner().notices.retain(|notice| notice.id != id);
    }

    fn set_is_suppressed(&self, suppressed: bool) {
        self.inner().suppressed = suppressed;
    }
}
