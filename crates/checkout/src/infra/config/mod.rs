use crate::{
    domain::{customer::Address, payment},
    infra::api,
};

pub mod file;

/// Configuration of a headless checkout run.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: api::Config,
    pub order: Order,
    pub cart_needs_payment: bool,
    pub payment: payment::MethodData,
    /// Validation rules of the billing fields.
    pub fields: Vec<FieldRule>,
}

/// The order to place.
#[derive(Debug, Clone, Default)]
pub struct Order {
    pub billing: Address,
    pub shipping: Address,
    pub notes: String,
    pub create_account: bool,
}

/// Validation of one billing address property.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Store API name of the address property, e.g. `postcode`.
    pub property: String,
    pub required: bool,
    /// Pattern the whole value has to match.
    pub pattern: Option<String>,
}
