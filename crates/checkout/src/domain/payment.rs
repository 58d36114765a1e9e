use {
    indexmap::IndexMap,
    serde::{Deserialize, Serialize},
};

/// Progress of the active payment method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Idle,
    Processing,
    Success,
    Error,
}

impl Status {
    pub fn has_error(self) -> bool {
        self == Self::Error
    }

    pub fn is_successful(self) -> bool {
        self == Self::Success
    }
}

/// A payment method registered with the checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// The gateway id the Store API knows this method by.
    pub payment_method_id: String,
}

/// Everything the payment method integrations report about the customer's
/// payment choice. The processor only reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodData {
    /// Name of the selected method, a key of either method map.
    pub active: String,
    pub status: Status,
    /// Method specific data collected by the integration.
    pub payload: IndexMap<String, serde_json::Value>,
    /// Methods with their own submission flow, e.g. wallets.
    pub express: IndexMap<String, Method>,
    pub regular: IndexMap<String, Method>,
    /// Whether the customer asked to save the payment method.
    pub should_save: bool,
}

/// One `payment_data` entry of the order payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub key: String,
    pub value: serde_json::Value,
}

impl MethodData {
    pub fn express_active(&self) -> bool {
        self.express.contains_key(&self.active)
    }

    /// Gateway id of the active method. Express methods take precedence when
    /// both maps know the active name.
    pub fn payment_method_id(&self) -> Option<&str> {
        self.express
            .get(&self.active)
            .or_else(|| self.regular.get(&self.active))
            .map(|method| method.payment_method_id.as_str())
    }

    /// The payload as `{key, value}` entries, followed by the flag telling the
    /// gateway whether to save the method.
    pub fn sanitized(&self) -> Vec<Entry> {
        self.payload
            .iter()
            .map(|(key, value)| Entry {
                key: key.clone(),
                value: value.clone(),
            })
            .chain(std::iter::once(Entry {
                key: format!("wc-{}-new-payment-method", self.active),
                value: serde_json::Value::Bool(self.should_save),
            }))
            .collect()
    }
}
