mod config;
mod dispatch;
mod event;
mod notify;
mod relay;
mod store;

use config::RelayConfig;
use dispatch::{DispatchQueue, Dispatcher};
use notify::Notifier;
use relay::MqttRelay;
use std::sync::Arc;
use store::{CheckinStore, EmployeeStore, MemoryStore};

use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = RelayConfig::from_env();

    info!("Attendance relay starting: {}", config.client_id);
    info!("  broker: {}", config.broker_url);
    info!("  topic: {}", config.topic);

    let store = Arc::new(MemoryStore::new());
    let employees: Arc<dyn EmployeeStore> = store.clone();
    let checkins: Arc<dyn CheckinStore> = store;

    let notifier = Notifier::new(config.event_capacity);

    // Tap the change feed; the surrounding system attaches its dashboard
    // push here
    let mut changes = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => debug!(?change, "store change"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    error!(skipped = n, "store change feed lagging");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let dispatcher = Dispatcher::new(employees, checkins, notifier);
    let queue = DispatchQueue::new(dispatcher, config.lanes, config.lane_capacity);

    let relay = MqttRelay::new(&config, queue)?;
    let handle = relay.handle();
    let relay_task = tokio::spawn(relay.run());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    handle.disconnect().await?;
    relay_task.await?;

    Ok(())
}
