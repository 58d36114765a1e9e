use {
    crate::{
        domain::{customer::Address, payment},
        infra::{self, api, config},
    },
    indexmap::IndexMap,
    serde::Deserialize,
    std::{
        path::{Path, PathBuf},
        time::Duration,
    },
    thiserror::Error,
    tokio::fs,
    url::Url,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Config {
    /// Root of the store's REST API, e.g. `https://shop.example/wp-json/`.
    store_url: Url,

    /// Timeout of Store API requests.
    #[serde(with = "humantime_serde", default = "default_timeout")]
    timeout: Duration,

    /// Maximum size of a Store API response body in bytes.
    #[serde(default = "default_response_size_limit")]
    response_size_limit: usize,

    /// Nonce of an existing Store API session.
    nonce: Option<String>,

    /// Whether the cart has to be paid for. Free carts are submitted without
    /// payment data.
    #[serde(default)]
    cart_needs_payment: bool,

    #[serde(default)]
    order: OrderConfig,

    #[serde(default)]
    payment: PaymentConfig,

    /// Validation rules of the billing address.
    #[serde(default)]
    fields: Vec<FieldConfig>,
}

/// Addresses use the property names of the Store API, e.g. `first_name`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct OrderConfig {
    #[serde(default)]
    billing: Address,
    #[serde(default)]
    shipping: Address,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    create_account: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PaymentConfig {
    /// Name of the selected method.
    #[serde(default)]
    active: String,
    #[serde(default)]
    status: payment::Status,
    /// Method specific data, sent as the order's payment data.
    #[serde(default)]
    data: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    methods: IndexMap<String, MethodConfig>,
    #[serde(default)]
    express_methods: IndexMap<String, MethodConfig>,
    #[serde(default)]
    should_save: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct MethodConfig {
    payment_method_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FieldConfig {
    property: String,
    #[serde(default)]
    required: bool,
    pattern: Option<String>,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_response_size_limit() -> usize {
    1_000_000
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error while reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown billing address property {0:?}")]
    UnknownProperty(String),
    #[error("invalid pattern for {property:?}: {source}")]
    Pattern {
        property: String,
        source: regex::Error,
    },
}

/// Loads the checkout configuration from a TOML file.
pub async fn load(path: &Path) -> Result<infra::Config, Error> {
    let data = fs::read_to_string(path).await.map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    parse(&data)
}

pub fn parse(data: &str) -> Result<infra::Config, Error> {
    let config: Config = toml::de::from_str(data)?;

    let fields = config
        .fields
        .into_iter()
        .map(|field| {
            if Address::default().get(&field.property).is_none() {
                return Err(Error::UnknownProperty(field.property));
            }
            if let Some(pattern) = &field.pattern {
                if let Err(source) = regex::Regex::new(pattern) {
                    return Err(Error::Pattern {
                        property: field.property,
                        source,
                    });
                }
            }
            Ok(config::FieldRule {
                property: field.property,
                required: field.required,
                pattern: field.pattern,
            })
        })
        .collect::<Result<_, _>>()?;

    let methods = |methods: IndexMap<String, MethodConfig>| {
        methods
            .into_iter()
            .map(|(name, method)| {
                (
                    name,
                    payment::Method {
                        payment_method_id: method.payment_method_id,
                    },
                )
            })
            .collect::<IndexMap<_, _>>()
    };

    Ok(infra::Config {
        api: api::Config {
            store_url: config.store_url,
            timeout: config.timeout,
            response_size_limit: config.response_size_limit,
            nonce: config.nonce,
        },
        order: config::Order {
            billing: config.order.billing,
            shipping: config.order.shipping,
            notes: config.order.notes,
            create_account: config.order.create_account,
        },
        cart_needs_payment: config.cart_needs_payment,
        payment: payment::MethodData {
            active: config.payment.active,
            status: config.payment.status,
            payload: config.payment.data,
            express: methods(config.payment.express_methods),
            regular: methods(config.payment.methods),
            should_save: config.payment.should_save,
        },
        fields,
    })
}
