//! Orchestrates checkout attempts.
//!
//! The [`Processor`] is re-evaluated with the current [`Inputs`] whenever
//! anything relevant changes. Each pass derives whether the checkout can
//! succeed, keeps the store's error flag in line with that, and submits the
//! order once an attempt is processing and nothing stands in its way.

use {
    crate::{
        domain::{
            checkout::{Action, Invalid, Phase, StartError, State, Store, Subscription},
            customer::Address,
            payment::MethodData,
            shipping,
            validation::Registry,
        },
        infra::{Cart, Navigator, Notices, StoreApi, notices, observe},
    },
    arc_swap::ArcSwap,
    std::sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    tokio::{sync::watch, task::JoinHandle},
};

pub mod payload;
mod submit;

/// Priority of the processor's own before-processing check.
pub const PRIORITY: u32 = 0;

pub const INVALID_FIELDS: &str = "Some input fields are invalid.";
pub const INVALID_PAYMENT: &str = "There was a problem with your payment option.";
pub const INVALID_SHIPPING: &str = "There was a problem with your shipping option.";

/// What the other checkout components report on each pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    pub billing_address: Address,
    pub shipping_address: Address,
    pub shipping: shipping::ErrorStatus,
    pub cart_needs_payment: bool,
    pub payment: MethodData,
}

/// Values derived from the inputs and the checkout state on every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    pub express_payment_method_active: bool,
    pub payment_method_id: Option<String>,
    pub checkout_will_have_error: bool,
    pub paid_and_without_errors: bool,
}

pub fn derive(inputs: &Inputs, state: &State, has_validation_errors: bool) -> Derived {
    let express = inputs.payment.express_active();
    // Express methods collect their own data, so field errors do not count.
    let checkout_will_have_error = (has_validation_errors && !express)
        || inputs.payment.status.has_error()
        || inputs.shipping.has_error();
    let paid = inputs.payment.status.is_successful() || !inputs.cart_needs_payment;
    Derived {
        express_payment_method_active: express,
        payment_method_id: inputs.payment.payment_method_id().map(str::to_owned),
        checkout_will_have_error,
        paid_and_without_errors: !state.has_error
            && !checkout_will_have_error
            && paid
            && state.phase == Phase::Processing,
    }
}

/// The before-processing verdict. Validation problems take precedence over
/// payment problems, which take precedence over shipping problems.
pub fn check(inputs: &Inputs, has_validation_errors: bool) -> Result<(), Invalid> {
    if has_validation_errors {
        return Err(Invalid::new(INVALID_FIELDS));
    }
    if inputs.payment.status.has_error() {
        return Err(Invalid::new(INVALID_PAYMENT));
    }
    if inputs.shipping.has_error() {
        return Err(Invalid::new(INVALID_SHIPPING));
    }
    Ok(())
}

/// The services the processor talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub api: Arc<dyn StoreApi>,
    pub notices: Arc<dyn Notices>,
    pub cart: Arc<dyn Cart>,
    pub navigator: Arc<dyn Navigator>,
}

/// Drives checkout attempts of one session. Dropping the processor
/// unregisters its before-processing check; a submission already in flight
/// still completes.
pub struct Processor {
    inner: Arc<Inner>,
    /// Present while the before-processing check is registered.
    subscription: Mutex<Option<Subscription>>,
    /// The suppression last applied to the notices.
    suppressed: Mutex<Option<bool>>,
}

struct Inner {
    store: Store,
    registry: Registry,
    api: Arc<dyn StoreApi>,
    notices: Arc<dyn Notices>,
    cart: Arc<dyn Cart>,
    navigator: Arc<dyn Navigator>,
    /// Written at the start of every pass, read when submitting so that the
    /// payload never uses stale addresses.
    latest: Arc<ArcSwap<Inputs>>,
    /// Held while an order submission is in flight.
    processing_order: AtomicBool,
    /// Whether the current completion already redirected.
    redirected: AtomicBool,
}

impl Processor {
    pub fn new(
        store: Store,
        registry: Registry,
        collaborators: Collaborators,
        inputs: Inputs,
    ) -> Self {
        let Collaborators {
            api,
            notices,
            cart,
            navigator,
        } = collaborators;
        Self {
            inner: Arc::new(Inner {
                store,
                registry,
                api,
                notices,
                cart,
                navigator,
                latest: Arc::new(ArcSwap::from_pointee(inputs)),
                processing_order: AtomicBool::new(false),
                redirected: AtomicBool::new(false),
            }),
            subscription: Mutex::new(None),
            suppressed: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// The inputs of the most recent pass.
    pub fn inputs(&self) -> Arc<Inputs> {
        self.inner.latest.load_full()
    }

    /// Whether an order submission is in flight.
    pub fn is_processing_order(&self) -> bool {
        self.inner.processing_order.load(Ordering::SeqCst)
    }

    pub fn derived(&self) -> Derived {
        derive(
            &self.inner.latest.load(),
            &self.inner.store.state(),
            self.inner.registry.has_errors(),
        )
    }

    /// Runs a pass with new inputs. Returns the submission task if this pass
    /// started one.
    pub fn render(&self, inputs: Inputs) -> Option<JoinHandle<()>> {
        self.inner.latest.store(Arc::new(inputs));
        let derived = self.prepare();
        let express = derived.express_payment_method_active;

        let state = self.inner.store.state();
        if derived.checkout_will_have_error != state.has_error
            && state.phase.is_in_flight()
            && !express
        {
            self.inner
                .store
                .dispatch(Action::SetHasError(Some(derived.checkout_will_have_error)));
        }

        let submission = self.submit_if_ready();
        self.inner.redirect_if_complete();
        submission
    }

    /// Runs a pass with the inputs of the previous one.
    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        self.render(Inputs::clone(&self.inner.latest.load()))
    }

    /// Starts a checkout attempt, like pressing the place order button. When
    /// the attempt is rejected before processing, the reason is shown as the
    /// checkout notice and all validation errors are revealed. Returns the
    /// submission task if the attempt went ahead.
    pub fn place_order(&self) -> Result<Option<JoinHandle<()>>, StartError> {
        self.prepare();
        if let Err(err) = self.inner.store.begin_processing() {
            if let StartError::Invalid(invalid) = &err {
                self.inner
                    .notices
                    .add_error_notice(&invalid.message, notices::CHECKOUT);
                self.inner.registry.show_all();
            }
            return Err(err);
        }
        Ok(self.refresh())
    }

    /// Re-runs the processor whenever the inputs, the checkout state or the
    /// validation errors change. Returns once the inputs sender is dropped.
    pub async fn run(self, mut inputs: watch::Receiver<Inputs>) {
        let mut state = self.inner.store.subscribe();
        let mut errors = self.inner.registry.subscribe();
        self.render(inputs.borrow_and_update().clone());
        loop {
            tokio::select! {
                changed = inputs.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                Ok(()) = state.changed() => {}
                Ok(()) = errors.changed() => {}
            }
            self.render(inputs.borrow_and_update().clone());
        }
        observe::processor_stopped();
    }

    /// Applies the notice suppression and check registration the latest
    /// inputs call for. Never submits.
    fn prepare(&self) -> Derived {
        let derived = self.derived();
        let express = derived.express_payment_method_active;
        self.suppress_notices(express);
        self.register_check(!express);
        derived
    }

    /// Express payment methods show their own errors.
    fn suppress_notices(&self, suppressed: bool) {
        let mut current = lock(&self.suppressed);
        if *current != Some(suppressed) {
            self.inner.notices.set_is_suppressed(suppressed);
            observe::notices_suppressed(suppressed);
            *current = Some(suppressed);
        }
    }

    /// Registers or unregisters the before-processing check. The check reads
    /// the latest inputs, so it is only registered once.
    fn register_check(&self, registered: bool) {
        let mut subscription = lock(&self.subscription);
        match (registered, subscription.is_some()) {
            (true, false) => {
                let latest = self.inner.latest.clone();
                let registry = self.inner.registry.clone();
                *subscription = Some(self.inner.store.on_before_processing(PRIORITY, move || {
                    check(&latest.load(), registry.has_errors())
                }));
            }
            (false, true) => {
                if let Some(subscription) = subscription.take() {
                    subscription.unsubscribe();
                }
            }
            _ => (),
        }
    }

    fn submit_if_ready(&self) -> Option<JoinHandle<()>> {
        if !self.derived().paid_and_without_errors {
            return None;
        }
        if self.inner.processing_order.swap(true, Ordering::SeqCst) {
            observe::submission_in_flight();
            return None;
        }
        Some(tokio::spawn(self.inner.clone().submit()))
    }
}

impl Inner {
    /// Sends the customer to the redirect URL once per completed attempt.
    fn redirect_if_complete(&self) {
        let state = self.store.state();
        match (state.phase, state.redirect_url) {
            (Phase::Complete, Some(url)) => {
                if !self.redirected.swap(true, Ordering::SeqCst) {
                    self.navigator.redirect(&url);
                }
            }
            (Phase::Complete, None) => (),
            _ => self.redirected.store(false, Ordering::SeqCst),
        }
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("store", &self.inner.store)
            .field("inputs", &*self.inner.latest.load_full())
            .field("processing_order", &self.is_processing_order())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests;
