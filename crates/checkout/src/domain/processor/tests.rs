use {
    super::*,
    crate::{
        domain::{
            payment::{Method, Status},
            validation::{FieldId, ValidationError},
        },
        infra::{
            api::{self, MockStoreApi},
            cart::MockCart,
            navigation::Recorder,
            notices::{Board, Notice},
        },
        util,
    },
    indexmap::indexmap,
    reqwest::{
        StatusCode,
        header::{HeaderMap, HeaderValue},
    },
    serde_json::{Value, json},
    url::Url,
};

const THANK_YOU: &str = "https://shop.example/checkout/order-received/7";

fn raw(status: StatusCode, body: Value) -> api::Response {
    let mut headers = HeaderMap::new();
    headers.insert(api::NONCE_HEADER, HeaderValue::from_static("nonce-2"));
    headers.insert(api::USER_HEADER, HeaderValue::from_static("42"));
    api::Response {
        status,
        headers,
        body: body.to_string(),
    }
}

fn placed() -> Value {
    json!({
        "order_id": 7,
        "status": "processing",
        "payment_result": {
            "payment_status": "success",
            "redirect_url": THANK_YOU,
        },
    })
}

fn card() -> MethodData {
    MethodData {
        active: "card".to_owned(),
        status: Status::Success,
        payload: indexmap! { "token".to_owned() => json!("tok_1") },
        express: indexmap! {
            "wallet".to_owned() => Method { payment_method_id: "stripe-express".to_owned() },
        },
        regular: indexmap! {
            "card".to_owned() => Method { payment_method_id: "stripe".to_owned() },
        },
        should_save: false,
    }
}

fn wallet() -> MethodData {
    MethodData {
        active: "wallet".to_owned(),
        ..card()
    }
}

fn free_order() -> Inputs {
    Inputs {
        billing_address: Address {
            first_name: "Ada".to_owned(),
            email: Some("ada@example.com".to_owned()),
            ..Default::default()
        },
        ..Default::default()
    }
}

struct Setup {
    processor: Processor,
    notices: Arc<Board>,
    navigator: Arc<Recorder>,
}

fn setup(api: MockStoreApi, cart: MockCart, inputs: Inputs) -> Setup {
    ::observe::tracing::initialize_reentrant("checkout=trace");
    let notices = Arc::new(Board::default());
    let navigator = Arc::new(Recorder::default());
    let processor = Processor::new(
        Store::new(),
        Registry::new(),
        Collaborators {
            api: Arc::new(api),
            notices: notices.clone(),
            cart: Arc::new(cart),
            navigator: navigator.clone(),
        },
        inputs,
    );
    Setup {
        processor,
        notices,
        navigator,
    }
}

fn invalid_field() -> (FieldId, ValidationError) {
    (
        FieldId::from("billing-postcode"),
        ValidationError::new("Please match the requested format.", true),
    )
}

#[test]
fn validation_errors_only_count_without_express() {
    let state = State::default();
    let inputs = Inputs {
        payment: card(),
        ..Default::default()
    };
    assert!(derive(&inputs, &state, true).checkout_will_have_error);
    assert!(!derive(&inputs, &state, false).checkout_will_have_error);

    let express = Inputs {
        payment: wallet(),
        ..Default::default()
    };
    let derived = derive(&express, &state, true);
    assert!(derived.express_payment_method_active);
    assert!(!derived.checkout_will_have_error);
    assert_eq!(derived.payment_method_id.as_deref(), Some("stripe-express"));
}

#[test]
fn payment_and_shipping_errors_always_count() {
    let state = State::default();
    let payment = Inputs {
        payment: MethodData {
            status: Status::Error,
            ..wallet()
        },
        ..Default::default()
    };
    assert!(derive(&payment, &state, false).checkout_will_have_error);

    let shipping = Inputs {
        shipping: shipping::ErrorStatus::InvalidAddress,
        payment: wallet(),
        ..Default::default()
    };
    assert!(derive(&shipping, &state, false).checkout_will_have_error);
}

#[test]
fn paid_and_without_errors_needs_processing_phase() {
    let processing = State {
        phase: Phase::Processing,
        ..Default::default()
    };
    let unpaid = Inputs {
        cart_needs_payment: true,
        payment: MethodData {
            status: Status::Processing,
            ..card()
        },
        ..Default::default()
    };
    assert!(!derive(&unpaid, &processing, false).paid_and_without_errors);
    assert!(derive(&free_order(), &processing, false).paid_and_without_errors);
    assert!(!derive(&free_order(), &State::default(), false).paid_and_without_errors);

    let errored = State {
        has_error: true,
        ..processing
    };
    assert!(!derive(&free_order(), &errored, false).paid_and_without_errors);
}

#[test]
fn check_reports_first_problem() {
    let everything_wrong = Inputs {
        shipping: shipping::ErrorStatus::UnknownError,
        payment: MethodData {
            status: Status::Error,
            ..card()
        },
        ..Default::default()
    };
    assert_eq!(
        check(&everything_wrong, true),
        Err(Invalid::new(INVALID_FIELDS))
    );
    assert_eq!(
        check(&everything_wrong, false),
        Err(Invalid::new(INVALID_PAYMENT))
    );

    let shipping_only = Inputs {
        shipping: shipping::ErrorStatus::UnknownError,
        ..Default::default()
    };
    assert_eq!(
        check(&shipping_only, false),
        Err(Invalid::new(INVALID_SHIPPING))
    );
    assert_eq!(check(&free_order(), false), Ok(()));
}

#[test]
fn check_is_stable_for_unchanged_inputs() {
    let inputs = Inputs {
        shipping: shipping::ErrorStatus::InvalidAddress,
        ..Default::default()
    };
    assert_eq!(check(&inputs, false), check(&inputs, false));
    assert_eq!(check(&free_order(), false), check(&free_order(), false));
}

#[tokio::test]
async fn free_order_completes_and_redirects_once() {
    let mut api = MockStoreApi::new();
    api.expect_submit_order()
        .withf(|payload| {
            payload.payment_method.is_none()
                && payload.payment_data.is_none()
                && payload.billing_address.first_name == "Ada"
        })
        .times(1)
        .returning(|_| Ok(raw(StatusCode::OK, placed())));
    api.expect_set_nonce()
        .withf(|headers| headers.get(api::NONCE_HEADER).unwrap() == "nonce-2")
        .times(1)
        .return_const(());
    let Setup {
        processor,
        notices,
        navigator,
    } = setup(api, MockCart::new(), free_order());
    notices.add_error_notice("stale failure", notices::CHECKOUT);

    let submission = processor.place_order().unwrap().unwrap();
    submission.await.unwrap();

    let state = processor.store().state();
    assert_eq!(state.phase, Phase::Complete);
    assert!(!state.has_error);
    assert_eq!(state.customer_id, Some(42));
    assert!(!processor.is_processing_order());
    assert_eq!(notices.get(notices::CHECKOUT), None);
    assert_eq!(navigator.visited(), vec![Url::parse(THANK_YOU).unwrap()]);

    // Further passes neither submit again nor redirect again.
    assert!(processor.refresh().is_none());
    assert_eq!(navigator.visited().len(), 1);
}

#[tokio::test]
async fn paid_order_sends_payment_method() {
    let mut api = MockStoreApi::new();
    api.expect_submit_order()
        .withf(|payload| {
            payload.payment_method.as_deref() == Some("stripe")
                && payload
                    .payment_data
                    .as_ref()
                    .is_some_and(|data| data.len() == 2)
        })
        .times(1)
        .returning(|_| Ok(raw(StatusCode::OK, placed())));
    api.expect_set_nonce().return_const(());
    let Setup { processor, .. } = setup(
        api,
        MockCart::new(),
        Inputs {
            cart_needs_payment: true,
            payment: card(),
            ..free_order()
        },
    );

    processor.place_order().unwrap().unwrap().await.unwrap();
    assert_eq!(processor.store().phase(), Phase::Complete);
}

#[tokio::test]
async fn rejected_order_reports_every_error() {
    let mut api = MockStoreApi::new();
    api.expect_submit_order().times(1).returning(|_| {
        Err(api::Error::Rejected(raw(
            StatusCode::BAD_REQUEST,
            json!({
                "code": "woocommerce_rest_checkout_error",
                "message": "There was a problem with your order.",
                "data": { "status": 400, "cart": { "items_count": 0 } },
                "additional_errors": [{ "error_code": "e1", "message": "Bad field" }],
            }),
        )))
    });
    api.expect_set_nonce().times(1).return_const(());
    let mut cart = MockCart::new();
    cart.expect_receive_cart()
        .withf(|cart| cart == &json!({ "items_count": 0 }))
        .times(1)
        .return_const(());
    let Setup {
        processor,
        notices,
        navigator,
    } = setup(api, cart, free_order());

    processor.place_order().unwrap().unwrap().await.unwrap();

    let state = processor.store().state();
    assert!(state.has_error);
    assert_eq!(state.phase, Phase::HasError);
    assert_eq!(state.customer_id, Some(42));
    assert_eq!(
        state.after_processing.map(|response| response.status),
        Some(Some(400))
    );
    assert_eq!(
        notices.get("e1"),
        Some(Notice {
            id: "e1".to_owned(),
            message: "Bad field".to_owned(),
        })
    );
    assert_eq!(
        notices.get(notices::CHECKOUT).unwrap().message,
        "There was a problem with your order."
    );
    assert!(!processor.is_processing_order());
    assert!(navigator.visited().is_empty());
}

#[tokio::test]
async fn declined_payment_marks_error() {
    let mut api = MockStoreApi::new();
    api.expect_submit_order().returning(|_| {
        Ok(raw(
            StatusCode::OK,
            json!({
                "status": "failed",
                "payment_result": { "payment_status": "failure", "redirect_url": "" },
            }),
        ))
    });
    api.expect_set_nonce().return_const(());
    let Setup {
        processor, notices, ..
    } = setup(api, MockCart::new(), free_order());

    processor.place_order().unwrap().unwrap().await.unwrap();

    assert_eq!(processor.store().phase(), Phase::HasError);
    assert_eq!(
        notices.get(notices::CHECKOUT).unwrap().message,
        api::dto::GENERIC_ERROR
    );
}

#[tokio::test]
async fn transport_failure_shows_generic_notice() {
    let mut api = MockStoreApi::new();
    api.expect_submit_order().returning(|_| {
        Err(api::Error::Http(util::http::Error::ResponseTooLarge {
            limit_bytes: 1,
        }))
    });
    api.expect_set_nonce().never();
    let Setup {
        processor, notices, ..
    } = setup(api, MockCart::new(), free_order());

    processor.place_order().unwrap().unwrap().await.unwrap();

    let state = processor.store().state();
    assert_eq!(state.phase, Phase::HasError);
    assert_eq!(state.customer_id, None);
    assert_eq!(
        state.after_processing.map(|response| response.body),
        Some(Value::Null)
    );
    assert_eq!(
        notices.get(notices::CHECKOUT).unwrap().message,
        api::dto::GENERIC_ERROR
    );
    assert!(!processor.is_processing_order());
}

#[tokio::test]
async fn unreadable_body_still_updates_session() {
    let mut api = MockStoreApi::new();
    api.expect_submit_order().times(1).returning(|_| {
        let raw = raw(StatusCode::OK, placed());
        Err(api::Error::Body {
            status: raw.status,
            headers: raw.headers,
            source: util::http::Error::ResponseTooLarge { limit_bytes: 10 },
        })
    });
    api.expect_set_nonce()
        .withf(|headers| headers.get(api::NONCE_HEADER).unwrap() == "nonce-2")
        .times(1)
        .return_const(());
    let Setup {
        processor,
        notices,
        navigator,
    } = setup(api, MockCart::new(), free_order());

    processor.place_order().unwrap().unwrap().await.unwrap();

    let state = processor.store().state();
    assert_eq!(state.phase, Phase::HasError);
    assert_eq!(state.customer_id, Some(42));
    assert_eq!(
        state.after_processing.map(|response| response.status),
        Some(Some(200))
    );
    assert_eq!(
        notices.get(notices::CHECKOUT).unwrap().message,
        api::dto::GENERIC_ERROR
    );
    assert!(!processor.is_processing_order());
    assert!(navigator.visited().is_empty());
}

#[tokio::test]
async fn place_order_outside_idle_does_not_submit() {
    let Setup { processor, .. } = setup(MockStoreApi::new(), MockCart::new(), free_order());
    processor.store().dispatch(Action::SetBeforeProcessing);
    processor.store().dispatch(Action::SetProcessing);

    assert_eq!(
        processor.place_order().unwrap_err(),
        StartError::Phase(Phase::Processing)
    );
    assert!(!processor.is_processing_order());
    assert_eq!(processor.store().phase(), Phase::Processing);
    assert_eq!(processor.store().observer_count(), 1);
}

#[tokio::test]
async fn invalid_fields_block_the_attempt() {
    let mut api = MockStoreApi::new();
    api.expect_submit_order()
        .times(1)
        .returning(|_| Ok(raw(StatusCode::OK, placed())));
    api.expect_set_nonce().return_const(());
    let Setup {
        processor, notices, ..
    } = setup(api, MockCart::new(), free_order());
    let (field, error) = invalid_field();
    processor.registry().set_errors([(field.clone(), error)]);

    assert_eq!(
        processor.place_order().unwrap_err(),
        StartError::Invalid(Invalid::new(INVALID_FIELDS))
    );
    assert_eq!(processor.store().phase(), Phase::HasError);
    assert_eq!(
        notices.get(notices::CHECKOUT).unwrap().message,
        INVALID_FIELDS
    );
    assert!(!processor.registry().get(&field).unwrap().hidden);

    // Fixing the field allows a new attempt.
    processor.registry().clear(&field);
    assert_eq!(processor.store().observer_count(), 1);
    processor.place_order().unwrap().unwrap().await.unwrap();
    assert_eq!(processor.store().phase(), Phase::Complete);
    assert_eq!(notices.get(notices::CHECKOUT), None);
}

#[tokio::test]
async fn express_payment_suppresses_notices_and_skips_check() {
    let mut api = MockStoreApi::new();
    api.expect_submit_order()
        .withf(|payload| payload.payment_method.as_deref() == Some("stripe-express"))
        .times(1)
        .returning(|_| Ok(raw(StatusCode::OK, placed())));
    api.expect_set_nonce().return_const(());
    let Setup {
        processor, notices, ..
    } = setup(
        api,
        MockCart::new(),
        Inputs {
            cart_needs_payment: true,
            payment: wallet(),
            ..free_order()
        },
    );
    let (field, error) = invalid_field();
    processor.registry().set_errors([(field, error)]);

    processor.refresh();
    assert!(notices.is_suppressed());
    assert_eq!(processor.store().observer_count(), 0);

    processor.place_order().unwrap().unwrap().await.unwrap();
    assert_eq!(processor.store().phase(), Phase::Complete);

    // Switching back to a regular method registers the check again.
    processor.render(Inputs {
        payment: card(),
        ..free_order()
    });
    assert!(!notices.is_suppressed());
    assert_eq!(processor.store().observer_count(), 1);
}

#[tokio::test]
async fn error_during_processing_is_flagged() {
    let Setup { processor, .. } = setup(MockStoreApi::new(), MockCart::new(), free_order());
    processor.store().dispatch(Action::SetBeforeProcessing);
    processor.store().dispatch(Action::SetProcessing);

    let submission = processor.render(Inputs {
        shipping: shipping::ErrorStatus::InvalidAddress,
        ..free_order()
    });

    assert!(submission.is_none());
    let state = processor.store().state();
    assert!(state.has_error);
    assert_eq!(state.phase, Phase::HasError);
}

#[tokio::test]
async fn latch_prevents_duplicate_submission_and_latest_inputs_are_sent() {
    let mut api = MockStoreApi::new();
    api.expect_submit_order()
        .withf(|payload| payload.billing_address.first_name == "Grace")
        .times(1)
        .returning(|_| Ok(raw(StatusCode::OK, placed())));
    api.expect_set_nonce().return_const(());
    let Setup { processor, .. } = setup(api, MockCart::new(), free_order());

    let submission = processor.place_order().unwrap().unwrap();
    assert!(processor.is_processing_order());

    // The submission task has not run yet on this single threaded runtime.
    let mut renamed = free_order();
    renamed.billing_address.first_name = "Grace".to_owned();
    assert!(processor.render(renamed).is_none());

    submission.await.unwrap();
    assert_eq!(processor.store().phase(), Phase::Complete);
}

#[tokio::test]
async fn dropping_processor_unregisters_check() {
    let Setup { processor, .. } = setup(MockStoreApi::new(), MockCart::new(), free_order());
    processor.refresh();
    let store = processor.store().clone();
    assert_eq!(store.observer_count(), 1);

    drop(processor);
    assert_eq!(store.observer_count(), 0);
}

#[tokio::test]
async fn submission_in_flight_completes_after_drop() {
    let mut api = MockStoreApi::new();
    api.expect_submit_order()
        .times(1)
        .returning(|_| Ok(raw(StatusCode::OK, placed())));
    api.expect_set_nonce().return_const(());
    let Setup {
        processor,
        navigator,
        ..
    } = setup(api, MockCart::new(), free_order());
    let store = processor.store().clone();
    let inner = processor.inner.clone();

    let submission = processor.place_order().unwrap().unwrap();
    drop(processor);
    assert_eq!(store.observer_count(), 0);

    submission.await.unwrap();
    assert_eq!(store.phase(), Phase::Complete);
    assert_eq!(store.state().customer_id, Some(42));
    assert!(!inner.processing_order.load(Ordering::SeqCst));
    assert_eq!(navigator.visited(), vec![Url::parse(THANK_YOU).unwrap()]);
}

#[tokio::test]
async fn run_reacts_to_store_changes() {
    let mut api = MockStoreApi::new();
    api.expect_submit_order()
        .times(1)
        .returning(|_| Ok(raw(StatusCode::OK, placed())));
    api.expect_set_nonce().return_const(());
    let Setup {
        processor,
        navigator,
        ..
    } = setup(api, MockCart::new(), free_order());
    let store = processor.store().clone();
    let (inputs, receiver) = watch::channel(free_order());

    let driver = tokio::spawn(processor.run(receiver));
    tokio::task::yield_now().await;
    assert_eq!(store.observer_count(), 1);

    store.begin_processing().unwrap();
    store
        .subscribe()
        .wait_for(|state| state.phase == Phase::Complete)
        .await
        .unwrap();

    drop(inputs);
    driver.await.unwrap();
    assert_eq!(navigator.visited(), vec![Url::parse(THANK_YOU).unwrap()]);
}
