use {
    crate::Config,
    std::{io::IsTerminal, panic::PanicHookInfo, sync::Once},
    time::macros::format_description,
    tracing::{Level, level_filters::LevelFilter},
    tracing_subscriber::{
        EnvFilter,
        Layer,
        Registry,
        fmt::{time::UtcTime, writer::MakeWriterExt as _},
        prelude::*,
        util::SubscriberInitExt,
    },
};

/// Initializes the tracing setup that is shared between the binaries.
/// `env_filter` has similar syntax to env_logger. It is documented at
/// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
pub fn initialize(config: &Config) {
    set_tracing_subscriber(config);
    std::panic::set_hook(Box::new(tracing_panic_hook));
}

/// Like [`initialize`], but can be called multiple times in a row. Later calls
/// are ignored.
///
/// Useful for tests.
pub fn initialize_reentrant(env_filter: &str) {
    // The tracing subscriber below is global object so initializing it again in the
    // same process by a different thread would fail.
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        set_tracing_subscriber(&Config::new(env_filter, Some(Level::ERROR), false));
        std::panic::set_hook(Box::new(tracing_panic_hook));
    });
}

fn set_tracing_subscriber(config: &Config) {
    let stderr_threshold = config.stderr_threshold.unwrap_or(Level::ERROR);
    let writer = std::io::stdout
        .with_min_level(stderr_threshold)
        .or_else(std::io::stderr);
    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.use_json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_timer(timer)
            .with_filter(EnvFilter::new(&config.env_filter))
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_timer(timer)
            .with_ansi(std::io::stdout().is_terminal())
            .with_filter(EnvFilter::new(&config.env_filter))
            .boxed()
    };

    // Another subscriber may already be installed, e.g. by a different test.
    if let Err(err) = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(LevelFilter::TRACE)
        .try_init()
    {
        eprintln!("tracing subscriber already installed: {err}");
        return;
    }
    tracing::info!(filter = %config.env_filter, json = config.use_json_format, "initialized logging");
}

/// Panic hook that prints roughly the same message as the default panic hook
/// but uses tracing:error instead of stderr.
///
/// Useful when we want panic messages to have the proper log format for log
/// aggregation.
fn tracing_panic_hook(panic: &PanicHookInfo) {
    let thread = std::thread::current();
    let name = thread.name().unwrap_or("<unnamed>");
    let backtrace = std::backtrace::Backtrace::force_capture();
    tracing::error!("thread '{name}' {panic}\nstack backtrace:\n{backtrace}");
}
