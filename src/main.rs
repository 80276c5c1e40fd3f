use std::sync::Arc;
use timetrial::{
    config::AppConfig, routes, storage, AppState, ChatNotifier, EventBus, EventDispatcher,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timetrial=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Server stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting time-trial records server");

    let config = AppConfig::from_env()?;

    let store = storage::connect(&config.database_url).await?;
    store.ensure_schema().await?;
    store.health_check().await?;
    info!(backend = ?store.dialect(), "Storage ready");

    let event_bus = EventBus::new(config.events.channel_capacity);
    let mut dispatcher = EventDispatcher::new(event_bus.clone())
        .with_handler_timeout(config.events.handler_timeout())
        .with_max_retries(config.events.max_retries);
    dispatcher.add_handler(Arc::new(ChatNotifier::new()));
    let _dispatcher = dispatcher.start_listening();

    let app_state = AppState::with_system_clock(store, &config, event_bus);
    let app = routes::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
