use {
    crate::domain::{customer::Address, payment},
    indexmap::IndexMap,
    serde::{Deserialize, Serialize},
};

/// Shown when the Store API did not explain what went wrong.
pub const GENERIC_ERROR: &str = "Something went wrong. Please contact us to get assistance.";

/// Body of `POST /wc/store/checkout`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub billing_address: Address,
    pub shipping_address: Address,
    pub customer_note: String,
    pub should_create_account: bool,
    /// Only sent when the cart needs payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_data: Option<Vec<payment::Entry>>,
}

/// Error body of the Store API. Every field is optional so that any JSON
/// object can be read as one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    pub code: Option<String>,
    pub message: Option<String>,
    pub data: ErrorData,
    pub additional_errors: Vec<AdditionalError>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ErrorData {
    pub status: Option<u16>,
    /// Updated cart, sent when the checkout failed because of the cart.
    pub cart: Option<serde_json::Value>,
    /// Per parameter messages of `rest_invalid_param` errors.
    pub params: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdditionalError {
    pub error_code: String,
    pub message: String,
}

impl ErrorResponse {
    /// Reads an error from any response body, falling back to an empty error
    /// when the body has an unexpected shape.
    pub fn from_body(body: &serde_json::Value) -> Self {
        serde_json::from_value(body.clone()).unwrap_or_default()
    }

    /// The message to show the customer.
    pub fn user_message(&self) -> String {
        if self.code.as_deref() == Some("rest_invalid_param") {
            let first = self
                .data
                .params
                .values()
                .next()
                .and_then(serde_json::Value::as_str);
            if let Some(first) = first {
                return first.to_owned();
            }
        }
        self.message
            .clone()
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| GENERIC_ERROR.to_owned())
    }
}
