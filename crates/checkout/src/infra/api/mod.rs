//! Client for the checkout endpoint of the WooCommerce Store API.

use {
    crate::{infra::observe, util},
    arc_swap::ArcSwapOption,
    reqwest::{
        StatusCode,
        header::{CACHE_CONTROL, HeaderMap, HeaderValue},
    },
    std::{sync::Arc, time::Duration},
    thiserror::Error,
    url::Url,
};

pub mod dto;

pub use dto::Payload;

/// Path of the checkout endpoint relative to the REST API root.
pub const CHECKOUT_PATH: &str = "wc/store/checkout";
/// `X-WC-Store-API-Nonce`, carries the session nonce in both directions.
pub const NONCE_HEADER: &str = "x-wc-store-api-nonce";
/// `X-WC-Store-API-User`, the id of the customer the session belongs to.
pub const USER_HEADER: &str = "x-wc-store-api-user";

/// Store API transport. Interpreting status codes and bodies is left to the
/// caller.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait StoreApi: Send + Sync + 'static {
    /// Submits the order. Non-2xx answers are returned as
    /// [`Error::Rejected`] together with the raw response.
    async fn submit_order(&self, payload: &Payload) -> Result<Response, Error>;

    /// Adopts the session nonce found in the response headers, if any.
    fn set_nonce(&self, headers: &HeaderMap);
}

/// A response as it came off the wire, with the body left unparsed.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Reads the customer id the Store API attached to a response.
pub fn customer_id(headers: &HeaderMap) -> Option<u64> {
    let raw = headers.get(USER_HEADER)?;
    let parsed = raw
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse().ok());
    if parsed.is_none() {
        observe::invalid_customer_id(raw);
    }
    parsed
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("checkout rejected with status {}", .0.status)]
    Rejected(Response),
    #[error("HTTP error: {0:?}")]
    Http(#[from] util::http::Error),
    /// The response arrived but its body could not be read.
    #[error("unreadable response body with status {status}: {source:?}")]
    Body {
        status: StatusCode,
        headers: HeaderMap,
        source: util::http::Error,
    },
    #[error("invalid store URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.into())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the site's REST API, e.g. `https://shop.example/wp-json/`.
    pub store_url: Url,
    pub timeout: Duration,
    pub response_size_limit: usize,
    /// Nonce to start the session with.
    pub nonce: Option<String>,
}

/// Store API over HTTP. The session nonce is shared by every request made
/// through this client.
pub struct StoreHttpApi {
    endpoint: Url,
    client: reqwest::Client,
    nonce: ArcSwapOption<HeaderValue>,
    response_size_limit: usize,
}

impl StoreHttpApi {
    pub fn new(config: Config) -> Result<Self, Error> {
        let nonce = config
            .nonce
            .as_deref()
            .and_then(|nonce| HeaderValue::from_str(nonce).ok())
            .map(Arc::new);
        Ok(Self {
            endpoint: util::join(&config.store_url, CHECKOUT_PATH)?,
            client: reqwest::Client::builder()
                .timeout(config.timeout)
                .build()?,
            nonce: ArcSwapOption::new(nonce),
            response_size_limit: config.response_size_limit,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The nonce the next request will carry.
    pub fn nonce(&self) -> Option<HeaderValue> {
        self.nonce.load_full().map(|nonce| (*nonce).clone())
    }
}

#[async_trait::async_trait]
impl StoreApi for StoreHttpApi {
    async fn submit_order(&self, payload: &Payload) -> Result<Response, Error> {
        observe::store_api_request(&self.endpoint, payload);
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .header(CACHE_CONTROL, "no-store");
        if let Some(nonce) = self.nonce() {
            request = request.header(NONCE_HEADER, nonce);
        }

        let mut response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = match util::http::body(self.response_size_limit, &mut response).await {
            Ok(body) => body,
            Err(source) => {
                return Err(Error::Body {
                    status,
                    headers,
                    source,
                });
            }
        };
        observe::store_api_response(status, &body);

        let response = Response {
            status,
            headers,
            body,
        };
        if !status.is_success() {
            return Err(Error::Rejected(response));
        }
        Ok(response)
    }

    fn set_nonce(&self, headers: &HeaderMap) {
        if let Some(nonce) = headers.get(NONCE_HEADER) {
            self.nonce.store(Some(Arc::new(nonce.clone())));
            observe::nonce_updated();
        }
    }
}
