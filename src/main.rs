use std::sync::Arc;

use ravel::config::SyncConfig;
use ravel::document::DocumentStore;
use ravel::registry::ChannelRegistry;
use ravel::slack::{MessagingService, SlackClient, spawn_socket_listener};
use ravel::sync::{InboundMapper, OutboundReconciler, SyncEngine};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = SyncConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let registry = Arc::new(ChannelRegistry::load(&config.channels_path).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }));

    let slack = SlackClient::new(config.bot_token.clone(), config.api_base.clone());
    match slack.health_check().await {
        Ok(bot_user) => tracing::info!(bot_user = %bot_user, "Slack bot authenticated"),
        Err(e) => tracing::warn!(error = %e, "Slack auth check failed; continuing"),
    }
    let service: Arc<dyn MessagingService> = Arc::new(slack);

    let store = Arc::new(DocumentStore::new(
        config.document_path.clone(),
        Arc::clone(&registry),
    ));

    eprintln!("⚡️ Ravel v{} (Socket Mode)", env!("CARGO_PKG_VERSION"));
    eprintln!("   Document: {}", store.path().display());
    eprintln!(
        "   Channels: {}",
        registry
            .iter()
            .map(|c| format!("#{}", c.name))
            .collect::<Vec<_>>()
            .join(", ")
    );
    eprintln!("   Poll interval: {}ms", config.poll_interval.as_millis());
    eprintln!(
        "   Inbound sync: {}\n",
        if config.enabled { "enabled" } else { "disabled" }
    );

    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let _listener = spawn_socket_listener(
        config.app_token.clone(),
        config.api_base.clone(),
        events_tx,
    );

    let engine = SyncEngine::new(
        InboundMapper::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            Arc::clone(&service),
            config.enabled,
        ),
        OutboundReconciler::new(registry, store, service),
        config.poll_interval,
    );

    engine
        .run(events_rx, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
