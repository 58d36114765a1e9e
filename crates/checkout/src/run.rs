use {
    crate::{
        domain::{
            checkout::{Action, Phase, Store},
            customer::Address,
            processor::{Collaborators, Inputs, Processor},
            shipping,
            validation::{Field, Registry, TextInput, field},
        },
        infra::{
            StoreHttpApi,
            cart,
            cli,
            config::{self, FieldRule},
            navigation::Recorder,
            notices::Board,
        },
    },
    anyhow::Context,
    clap::Parser,
    std::sync::Arc,
};

pub async fn main() -> anyhow::Result<()> {
    run(std::env::args()).await
}

/// Places the order described by the configuration file. Fails when the
/// order could not be placed.
pub async fn run(args: impl Iterator<Item = String>) -> anyhow::Result<()> {
    let args = cli::Args::parse_from(args);
    observe::tracing::initialize(&observe::Config::new(
        &args.log,
        args.stderr_threshold,
        args.use_json_logs,
    ));
    tracing::info!("running checkout with {args:#?}");

    let config = config::file::load(&args.config)
        .await
        .with_context(|| format!("loading {:?}", args.config))?;

    let store = Store::new();
    store.dispatch(Action::SetOrderNotes(config.order.notes.clone()));
    store.dispatch(Action::SetShouldCreateAccount(config.order.create_account));
    let registry = Registry::new();
    let fields = mount_fields(&config.fields, &config.order.billing, &registry)?;

    let notices = Arc::new(Board::default());
    let navigator = Arc::new(Recorder::default());
    let processor = Processor::new(
        store.clone(),
        registry.clone(),
        Collaborators {
            api: Arc::new(StoreHttpApi::new(config.api).context("creating Store API client")?),
            notices: notices.clone(),
            cart: Arc::new(cart::Latest::default()),
            navigator: navigator.clone(),
        },
        Inputs {
            billing_address: config.order.billing,
            shipping_address: config.order.shipping,
            shipping: shipping::ErrorStatus::Valid,
            cart_needs_payment: config.cart_needs_payment,
            payment: config.payment,
        },
    );

    match processor.place_order() {
        Ok(Some(submission)) => {
            tokio::select! {
                result = submission => result.context("order submission panicked")?,
                _ = shutdown_signal() => tracing::info!("interrupted, not waiting for the store"),
            }
        }
        Ok(None) => (),
        Err(err) => tracing::warn!(%err, "checkout attempt rejected"),
    }

    for (field, error) in registry.errors() {
        tracing::warn!(%field, message = %error.message, "invalid field");
    }
    for notice in notices.visible() {
        tracing::warn!(id = %notice.id, message = %notice.message, "notice");
    }
    drop(fields);

    let state = store.state();
    if state.phase != Phase::Complete {
        anyhow::bail!("order was not placed, checkout is {}", state.phase);
    }
    tracing::info!(
        customer_id = ?state.customer_id,
        redirect = ?navigator.visited().first().map(|url| url.as_str()),
        "order placed"
    );
    Ok(())
}

/// Mounts a validated input for every configured billing field.
fn mount_fields(
    rules: &[FieldRule],
    billing: &Address,
    registry: &Registry,
) -> anyhow::Result<Vec<Field<TextInput>>> {
    rules
        .iter()
        .map(|rule| {
            let mut input = TextInput::new(billing.get(&rule.property).unwrap_or_default());
            if rule.required {
                input = input.required();
            }
            if let Some(pattern) = &rule.pattern {
                input = input
                    .with_pattern(pattern)
                    .with_context(|| format!("pattern of {}", rule.property))?;
            }
            Ok(Field::mount(
                input,
                registry.clone(),
                field::Config {
                    id: Some(format!("billing-{}", rule.property)),
                    ..Default::default()
                },
                |_| (),
            ))
        })
        .collect()
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Containers send SIGTERM, Ctrl-C sends SIGINT.
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(?err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await
            }
        }
    };
    tokio::select! {
        _ = sigterm => (),
        _ = tokio::signal::ctrl_c() => (),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
