use {
    super::{Inner, payload},
    crate::{
        domain::checkout::{Action, Response},
        infra::{
            api::{self, dto::ErrorResponse},
            notices,
            observe,
        },
    },
    reqwest::header::HeaderMap,
    serde_json::Value,
    std::sync::{Arc, atomic::Ordering},
};

impl Inner {
    /// Submits the order built from the latest inputs and hands the outcome
    /// to the store. Releases the processing latch when done.
    pub(super) async fn submit(self: Arc<Self>) {
        self.notices.remove_notice(notices::CHECKOUT);
        let payload = payload::build(&self.latest.load(), &self.store.state());
        observe::submitting(&payload);

        let response = match self.api.submit_order(&payload).await {
            Ok(raw) => {
                self.receive_session(&raw.headers);
                let status = Some(raw.status.as_u16());
                match serde_json::from_str(&raw.body) {
                    Ok(body) => self.answered(Response { status, body }),
                    Err(err) => {
                        observe::unparsable_body(&err);
                        self.failed(Response {
                            status,
                            body: Value::String(raw.body),
                        })
                    }
                }
            }
            Err(err) => {
                observe::submission_failed(&err);
                match err {
                    api::Error::Rejected(raw) => {
                        self.receive_session(&raw.headers);
                        self.failed(Response {
                            status: Some(raw.status.as_u16()),
                            body: lenient_body(raw.body),
                        })
                    }
                    api::Error::Body {
                        status, headers, ..
                    } => {
                        self.receive_session(&headers);
                        self.failed(Response {
                            status: Some(status.as_u16()),
                            body: Value::Null,
                        })
                    }
                    _ => self.failed(Response {
                        status: None,
                        body: Value::Null,
                    }),
                }
            }
        };

        self.store.dispatch(Action::SetAfterProcessing(response));
        self.processing_order.store(false, Ordering::SeqCst);
        self.redirect_if_complete();
    }

    /// Applies the session metadata every Store API response carries. The
    /// nonce goes first so that follow-up requests are authorized.
    fn receive_session(&self, headers: &HeaderMap) {
        self.api.set_nonce(headers);
        if let Some(customer_id) = api::customer_id(headers) {
            self.store.dispatch(Action::SetCustomerId(customer_id));
        }
    }

    /// The Store API accepted the request. The payment may still have failed.
    fn answered(&self, response: Response) -> Response {
        observe::submitted(&response);
        if !response.is_success() {
            let error = ErrorResponse::from_body(&response.body);
            self.notices
                .add_error_notice(&error.user_message(), notices::CHECKOUT);
            self.store.dispatch(Action::SetHasError(None));
        }
        response
    }

    /// The submission failed. Reports every error the Store API sent along.
    fn failed(&self, response: Response) -> Response {
        let error = ErrorResponse::from_body(&response.body);
        if let Some(cart) = error.data.cart.clone() {
            self.cart.receive_cart(cart);
        }
        self.notices
            .add_error_notice(&error.user_message(), notices::CHECKOUT);
        for additional in &error.additional_errors {
            self.notices
                .add_error_notice(&additional.message, &additional.error_code);
        }
        self.store.dispatch(Action::SetHasError(None));
        response
    }
}

/// Error bodies are kept even when they are not JSON.
fn lenient_body(raw: String) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    match serde_json::from_str(&raw) {
        Ok(body) => body,
        Err(err) => {
            observe::unparsable_body(&err);
            Value::String(raw)
        }
    }
}
