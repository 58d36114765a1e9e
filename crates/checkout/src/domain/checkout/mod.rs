//! The checkout-wide state machine.
//!
//! A checkout attempt moves through
//! `Idle → BeforeProcessing → Processing → Complete | HasError`. The state is
//! only ever changed by dispatching an [`Action`] to the [`Store`]; observers
//! registered for the before-processing phase decide whether an attempt may
//! move on to processing.

use {
    crate::infra::observe,
    std::sync::Arc,
    thiserror::Error,
    tokio::sync::watch,
    url::Url,
};

mod action;
pub mod hooks;
mod response;

pub use {
    action::Action,
    hooks::{Invalid, Subscription},
    response::Response,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    BeforeProcessing,
    Processing,
    Complete,
    HasError,
}

impl Phase {
    /// Whether an attempt is underway and not yet decided.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::BeforeProcessing | Self::Processing)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::BeforeProcessing => "before processing",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::HasError => "has error",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub phase: Phase,
    pub has_error: bool,
    pub redirect_url: Option<Url>,
    /// Set from the Store API once the customer is known, 0 for guests.
    pub customer_id: Option<u64>,
    pub order_notes: String,
    pub should_create_account: bool,
    /// The last response handed over with [`Action::SetAfterProcessing`].
    pub after_processing: Option<Response>,
}

/// Why a checkout attempt did not reach the processing phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("a checkout attempt cannot start while {0}")]
    Phase(Phase),
    #[error(transparent)]
    Invalid(#[from] Invalid),
}

/// Handle to the checkout state of one session. Clones share the state.
#[derive(Clone)]
pub struct Store {
    state: Arc<watch::Sender<State>>,
    observers: hooks::Shared,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(State::default())),
            observers: Default::default(),
        }
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> State {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    /// Applies `action`. Returns whether the state changed.
    pub fn dispatch(&self, action: Action) -> bool {
        self.state.send_if_modified(|state| state.reduce(action))
    }

    /// Notifies the receiver after every change of the state.
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    /// Registers `hook` to run whenever an attempt is in its before-processing
    /// phase. Lower priorities run first. The hook stays registered for as
    /// long as the returned subscription is alive.
    pub fn on_before_processing(
        &self,
        priority: u32,
        hook: impl Fn() -> Result<(), Invalid> + Send + Sync + 'static,
    ) -> Subscription {
        let id = hooks::lock(&self.observers).add(priority, Arc::new(hook));
        Subscription::new(id, &self.observers)
    }

    /// Starts a new checkout attempt: enters the before-processing phase, runs
    /// the observers in priority order and moves on to processing if none of
    /// them objects. The first objection marks the attempt as failed.
    pub fn begin_processing(&self) -> Result<(), StartError> {
        if !self.dispatch(Action::SetBeforeProcessing) {
            return Err(StartError::Phase(self.phase()));
        }

        if let Err(invalid) = self.run_before_processing() {
            observe::before_processing_failed(&invalid);
            self.dispatch(Action::SetHasError(None));
            return Err(invalid.into());
        }

        // Another component may have flagged an error while the observers ran.
        if !self.dispatch(Action::SetProcessing) {
            return Err(StartError::Phase(self.phase()));
        }
        Ok(())
    }

    /// Runs the observers outside the lock so they may use the store. An
    /// observer unsubscribed by an earlier one in the same run is skipped.
    fn run_before_processing(&self) -> Result<(), Invalid> {
        let snapshot = hooks::lock(&self.observers).snapshot();
        for (id, hook) in snapshot {
            if !hooks::lock(&self.observers).contains(id) {
                continue;
            }
            hook()?;
        }
        Ok(())
    }

    /// Number of registered before-processing observers.
    pub fn observer_count(&self) -> usize {
        hooks::lock(&self.observers).len()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.state.borrow())
            .field("observers", &self.observer_count())
            .finish()
    }
}
