use {
    super::{Phase, Response, State},
    crate::infra::observe,
    url::Url,
};

/// The only ways to change a checkout [`State`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Back to a pristine checkout.
    Reset,
    SetIdle,
    /// Starts a new submission attempt.
    SetBeforeProcessing,
    SetProcessing,
    /// Records whether the attempt has an error; `None` means `true`.
    SetHasError(Option<bool>),
    SetCustomerId(u64),
    /// Hands the submission outcome to the store, which completes or fails
    /// the attempt.
    SetAfterProcessing(Response),
    SetRedirectUrl(Option<Url>),
    SetOrderNotes(String),
    SetShouldCreateAccount(bool),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::SetIdle => "set_idle",
            Self::SetBeforeProcessing => "set_before_processing",
            Self::SetProcessing => "set_processing",
            Self::SetHasError(_) => "set_has_error",
            Self::SetCustomerId(_) => "set_customer_id",
            Self::SetAfterProcessing(_) => "set_after_processing",
            Self::SetRedirectUrl(_) => "set_redirect_url",
            Self::SetOrderNotes(_) => "set_order_notes",
            Self::SetShouldCreateAccount(_) => "set_should_create_account",
        }
    }
}

impl State {
    /// Applies `action`, returning whether the state changed. Actions that are
    /// not allowed in the current phase are ignored.
    pub(super) fn reduce(&mut self, action: Action) -> bool {
        let name = action.name();
        let before = self.phase;
        let next = match action {
            Action::Reset => State::default(),
            Action::SetIdle => State {
                phase: Phase::Idle,
                ..self.clone()
            },
            Action::SetBeforeProcessing => match self.phase {
                Phase::Idle | Phase::HasError => State {
                    phase: Phase::BeforeProcessing,
                    has_error: false,
                    redirect_url: None,
                    after_processing: None,
                    ..self.clone()
                },
                phase => return ignored(name, phase),
            },
            Action::SetProcessing => match self.phase {
                Phase::BeforeProcessing if !self.has_error => State {
                    phase: Phase::Processing,
                    ..self.clone()
                },
                phase => return ignored(name, phase),
            },
            Action::SetHasError(has_error) => {
                let has_error = has_error.unwrap_or(true);
                match (self.phase, has_error) {
                    (Phase::Complete, true) => return ignored(name, Phase::Complete),
                    (Phase::BeforeProcessing | Phase::Processing, true) => State {
                        phase: Phase::HasError,
                        has_error,
                        ..self.clone()
                    },
                    (Phase::HasError, false) => State {
                        phase: Phase::Idle,
                        has_error,
                        ..self.clone()
                    },
                    _ => State {
                        has_error,
                        ..self.clone()
                    },
                }
            }
            Action::SetCustomerId(customer_id) => State {
                customer_id: Some(customer_id),
                ..self.clone()
            },
            Action::SetAfterProcessing(response) => match self.phase {
                Phase::Processing | Phase::HasError => {
                    let failed = self.has_error || !response.is_success();
                    State {
                        phase: if failed {
                            Phase::HasError
                        } else {
                            Phase::Complete
                        },
                        has_error: failed,
                        redirect_url: response.redirect_url().or_else(|| self.redirect_url.clone()),
                        after_processing: Some(response),
                        ..self.clone()
                    }
                }
                phase => return ignored(name, phase),
            },
            Action::SetRedirectUrl(redirect_url) => State {
                redirect_url,
                ..self.clone()
            },
            Action::SetOrderNotes(order_notes) => State {
                order_notes,
                ..self.clone()
            },
            Action::SetShouldCreateAccount(should_create_account) => State {
                should_create_account,
                ..self.clone()
            },
        };

        if next == *self {
            return false;
        }
        *self = next;
        if before != self.phase {
            observe::phase_changed(name, before, self.phase);
        }
        true
    }
}

fn ignored(action: &str, phase: Phase) -> bool {
    observe::action_ignored(action, phase);
    false
}
