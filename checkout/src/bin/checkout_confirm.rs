//! Payment confirmation from the command line.
//!
//! Takes the return URL the payment processor sent the buyer to (or a bare
//! order id), polls the order service until the payment settles, and prints the
//! message a buyer would see.
//!
//! ```text
//! checkout-confirm 'https://shop.example.com/return?orderId=...'
//! ```

use anyhow::Context;
use std::sync::Arc;
use storefront_checkout::{
    Config, ConfirmationSession, OrderId, PaymentReturn, ProductionConfirmationEnvironment,
    StorefrontClient,
};
use storefront_core::environment::SystemClock;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_checkout=info,checkout_confirm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let target = std::env::args()
        .nth(1)
        .context("usage: checkout-confirm <return-url | order-id>")?;

    let config = Config::from_env().context("loading configuration")?;
    info!(
        api_url = %config.api.base_url,
        interval = ?config.confirmation.interval,
        deadline = ?config.confirmation.deadline,
        "Configuration loaded"
    );

    let payment_return = if target.contains('?') || target.contains("://") {
        PaymentReturn::from_url(&target)
    } else {
        PaymentReturn {
            order_id: OrderId::parse(&target).ok(),
            status_hint: None,
        }
    };

    let client = StorefrontClient::from_config(&config.api).context("building HTTP client")?;
    let environment =
        ProductionConfirmationEnvironment::new(Arc::new(SystemClock), Arc::new(client))
            .with_timing(config.confirmation);
    let session = ConfirmationSession::new(environment);

    session.start_from_return(&payment_return).await?;

    let outcome = tokio::select! {
        outcome = session.wait_for_outcome() => outcome,
        _ = signal::ctrl_c() => {
            warn!("Interrupted; abandoning confirmation");
            session.cancel().await;
            None
        }
    };

    match outcome {
        Some(phase) => {
            let state = session.snapshot().await;
            info!(%phase, fetches = state.fetches, "Confirmation finished");
            println!("{}", phase.user_message());
        },
        None => println!("Confirmation cancelled."),
    }

    Ok(())
}
