pub mod api;
pub mod cart;
pub mod cli;
pub mod config;
pub mod navigation;
pub mod notices;
pub mod observe;

pub use {
    api::{StoreApi, StoreHttpApi},
    cart::Cart,
    config::Config,
    navigation::Navigator,
    notices::Notices,
};
