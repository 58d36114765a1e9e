#![forbid(unsafe_code)]

pub mod domain;
pub mod infra;
pub mod run;
mod util;

pub use {
    domain::{checkout::Store, processor::Processor, validation::Registry},
    infra::Config,
};
