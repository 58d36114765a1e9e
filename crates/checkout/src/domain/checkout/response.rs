use {crate::infra::observe, serde_json::Value, url::Url};

/// Payment statuses the Store API uses for a declined or broken payment.
const FAILED_PAYMENT: [&str; 2] = ["failure", "error"];

/// What the checkout endpoint answered to a submission, handed to the store
/// once processing is over.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status, `None` when no response arrived at all.
    pub status: Option<u16>,
    /// The parsed body. `Null` without a body, a JSON string holding the raw
    /// text when the body was not JSON.
    pub body: Value,
}

impl Response {
    /// A response with a successful status whose payment did not fail.
    pub fn is_success(&self) -> bool {
        let status_ok = self
            .status
            .is_some_and(|status| (200..300).contains(&status));
        status_ok
            && !self
                .payment_status()
                .is_some_and(|status| FAILED_PAYMENT.contains(&status))
    }

    pub fn payment_status(&self) -> Option<&str> {
        self.body
            .pointer("/payment_result/payment_status")
            .and_then(Value::as_str)
    }

    /// Where the customer should be sent once the order is placed.
    pub fn redirect_url(&self) -> Option<Url> {
        let raw = self
            .body
            .pointer("/payment_result/redirect_url")
            .and_then(Value::as_str)
            .filter(|raw| !raw.is_empty())?;
        Url::parse(raw)
            .inspect_err(|err| observe::invalid_redirect_url(raw, err))
            .ok()
    }
}
