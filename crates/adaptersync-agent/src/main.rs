//! adaptersync agent - follows the assignable adapters of this device's model.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adaptersync_agent::{Agent, Args, RunOutcome};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adaptersync_agent=info,adaptersync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting adaptersync agent");

    let args = Args::parse();
    let config = args.into_config();

    tracing::info!(
        model = ?config.model,
        data_dir = ?config.data_dir,
        seed = ?config.seed_path,
        "configuration loaded"
    );

    let agent = Agent::open(config)?;
    agent.seed()?;

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);

    // Spawn shutdown signal handler
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx_clone.send(());
    });

    // Without a working subscription the agent has nothing to offer.
    let outcome = match agent.run_until_shutdown(shutdown_rx).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "agent failed");
            return Err(e.into());
        }
    };

    agent.bus().flush()?;
    match outcome {
        RunOutcome::Found => tracing::info!("assignable adapters found, exiting"),
        RunOutcome::Shutdown => tracing::info!("agent shutdown complete"),
        RunOutcome::Closed => tracing::warn!("distribution channel closed"),
    }

    Ok(())
}
