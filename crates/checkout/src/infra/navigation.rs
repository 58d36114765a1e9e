use {
    super::observe,
    std::sync::{Mutex, PoisonError},
    url::Url,
};

/// Sends the customer elsewhere, e.g. to the order confirmation page.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
pub trait Navigator: Send + Sync + 'static {
    fn redirect(&self, url: &Url);
}

/// Records redirects instead of following them, for headless checkouts.
#[derive(Debug, Default)]
pub struct Recorder {
    visited: Mutex<Vec<Url>>,
}

impl Recorder {
    pub fn visited(&self) -> Vec<Url> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for Recorder {
    fn redirect(&self, url: &Url) {
        observe::redirecting(url);
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.clone());
    }
}
