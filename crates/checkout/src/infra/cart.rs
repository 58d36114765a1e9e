use {arc_swap::ArcSwapOption, std::sync::Arc};

/// The storefront's cart. The Store API sends an updated cart along with some
/// checkout errors, e.g. when an item went out of stock.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
pub trait Cart: Send + Sync + 'static {
    fn receive_cart(&self, cart: serde_json::Value);
}

/// Remembers the most recent cart snapshot.
#[derive(Default)]
pub struct Latest(ArcSwapOption<serde_json::Value>);

impl Latest {
    pub fn get(&self) -> Option<Arc<serde_json::Value>> {
        self.0.load_full()
    }
}

impl Cart for Latest {
    fn receive_cart(&self, cart: serde_json::Value) {
        tracing::debug!("received updated cart");
        self.0.store(Some(Arc::new(cart)));
    }
}
