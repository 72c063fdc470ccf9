//! The agent event loop.

use std::sync::Arc;

use adaptersync::{AssignableAdapters, AssignableAdaptersSubscription};
use adaptersync_pubsub::{Bus, Publication};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::AgentConfig;
use crate::error::Error;
use crate::seed::{load_seed, publish_seed};

/// Why [`Agent::run_until_shutdown`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The record was found and the agent was told to stop then.
    Found,
    /// A shutdown signal arrived.
    Shutdown,
    /// The transport went away.
    Closed,
}

/// A device agent following its model's assignable adapters.
pub struct Agent {
    config: AgentConfig,
    bus: Bus,
}

impl Agent {
    /// Open the bus described by `config`.
    pub fn open(config: AgentConfig) -> Result<Self, Error> {
        let bus = match &config.data_dir {
            Some(dir) => Bus::open_persistent(dir)?,
            None => Bus::new(),
        };
        Ok(Self { config, bus })
    }

    /// Create an agent on an existing bus.
    pub fn with_bus(config: AgentConfig, bus: Bus) -> Self {
        Self { config, bus }
    }

    /// The distribution channel this agent uses.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Publish the configured seed file, if any. Returns the record count.
    pub fn seed(&self) -> Result<usize, Error> {
        let Some(path) = &self.config.seed_path else {
            return Ok(0);
        };
        let records = load_seed(path)?;
        let count = publish_seed(&Publication::new(self.bus.clone()), &records)?;
        info!(path = %path.display(), records = count, "seed published");
        Ok(count)
    }

    /// Resolve the model and subscribe to its record.
    pub fn subscribe(&self) -> Result<AssignableAdaptersSubscription, Error> {
        let model = self.config.model.source().model()?;
        info!(model = %model, "following assignable adapters");
        Ok(AssignableAdaptersSubscription::new(
            Arc::new(self.bus.clone()),
            model,
        )?)
    }

    /// Process changes until shutdown, transport loss, or, when configured,
    /// until the record is found.
    pub async fn run_until_shutdown(
        &self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<RunOutcome, Error> {
        let mut sub = self.subscribe()?;

        loop {
            let token = tokio::select! {
                token = sub.next_change() => token,
                Ok(()) = shutdown.recv() => {
                    info!("shutdown requested");
                    return Ok(RunOutcome::Shutdown);
                }
            };
            let Some(token) = token else {
                info!("distribution channel closed");
                return Ok(RunOutcome::Closed);
            };

            let was_found = sub.found();
            sub.process_change(token)?;
            report(&sub, was_found);

            if self.config.exit_when_found && sub.found() {
                return Ok(RunOutcome::Found);
            }
        }
    }
}

fn report(sub: &AssignableAdaptersSubscription, was_found: bool) {
    let record: &AssignableAdapters = sub.record();
    match (was_found, sub.found()) {
        (false, true) => info!(
            model = sub.model(),
            bundles = record.io_bundle_list.len(),
            "assignable adapters available"
        ),
        (true, true) => info!(
            model = sub.model(),
            bundles = record.io_bundle_list.len(),
            "assignable adapters updated"
        ),
        (true, false) => info!(model = sub.model(), "assignable adapters withdrawn"),
        (false, false) => debug!(model = sub.model(), "no change for this model"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use adaptersync::{IoBundle, IoType};

    use super::*;
    use crate::config::ModelSpec;

    fn config(model: &str) -> AgentConfig {
        AgentConfig::new(ModelSpec::Static(model.to_string()))
    }

    #[tokio::test]
    async fn test_exit_when_found_with_seed() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("seed.json");
        std::fs::write(
            &seed,
            r#"[{"Model": "model-B"}, {"Model": "model-A", "IoBundleList": [{"Type": 3, "Name": "COM1"}]}]"#,
        )
        .unwrap();

        let agent = Agent::open(config("model-A").with_seed(&seed).exit_when_found()).unwrap();
        assert_eq!(agent.seed().unwrap(), 2);

        let (_tx, rx) = broadcast::channel(1);
        let outcome = tokio::time::timeout(Duration::from_secs(5), agent.run_until_shutdown(rx))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, RunOutcome::Found);
    }

    #[tokio::test]
    async fn test_shutdown_signal() {
        let agent = Agent::open(config("model-A")).unwrap();
        let (tx, rx) = broadcast::channel(1);
        tx.send(()).unwrap();

        let outcome = agent.run_until_shutdown(rx).await.unwrap();
        assert_eq!(outcome, RunOutcome::Shutdown);
    }

    #[tokio::test]
    async fn test_closed_bus_ends_loop() {
        let bus = Bus::new();
        let agent = Agent::with_bus(config("model-A"), bus.clone());
        let (_tx, rx) = broadcast::channel(1);

        let publisher = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Publication::<AssignableAdapters>::new(bus.clone())
                .publish(
                    "model-A",
                    &AssignableAdapters::new("model-A")
                        .with_bundle(IoBundle::new(IoType::Usb, "USB")),
                )
                .unwrap();
            bus.close();
        });

        let outcome = agent.run_until_shutdown(rx).await.unwrap();
        publisher.await.unwrap();
        assert_eq!(outcome, RunOutcome::Closed);
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_keeps_running() {
        let bus = Bus::new();
        let agent = Agent::with_bus(config("model-A").exit_when_found(), bus.clone());
        let (tx, rx) = broadcast::channel(1);
        drop(tx);

        let publisher = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Publication::<AssignableAdapters>::new(bus)
                .publish("model-A", &AssignableAdapters::new("model-A"))
                .unwrap();
        });

        let outcome = tokio::time::timeout(Duration::from_secs(5), agent.run_until_shutdown(rx))
            .await
            .unwrap()
            .unwrap();
        publisher.await.unwrap();
        assert_eq!(outcome, RunOutcome::Found);
    }

    #[tokio::test]
    async fn test_invalid_model_is_fatal() {
        let agent = Agent::open(config(" ")).unwrap();
        let (_tx, rx) = broadcast::channel(1);

        let err = agent.run_until_shutdown(rx).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Adapter(adaptersync::Error::InvalidModel(_))
        ));
    }

    #[test]
    fn test_no_seed_configured() {
        let agent = Agent::open(config("model-A")).unwrap();
        assert_eq!(agent.seed().unwrap(), 0);
    }
}
