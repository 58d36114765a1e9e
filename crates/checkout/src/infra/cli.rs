use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
pub struct Args {
    /// The log filter.
    #[clap(long, env, default_value = "warn,checkout=debug")]
    pub log: String,

    /// At which log level logs should be printed to stderr instead of stdout.
    #[clap(long, env)]
    pub stderr_threshold: Option<tracing::Level>,

    /// Whether to use JSON format for the logs.
    #[clap(long, env, default_value = "false")]
    pub use_json_logs: bool,

    /// Path to the checkout configuration file. This file should be in TOML
    /// format and describe the store to check out from and the order to
    /// place.
    #[clap(long, env)]
    pub config: PathBuf,
}
