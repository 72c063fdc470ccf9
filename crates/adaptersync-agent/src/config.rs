//! Agent configuration.

use std::path::PathBuf;

use adaptersync::{FileModel, ModelSource, StaticModel};
use clap::Parser;

/// Default location of the hardware model override file.
pub const DEFAULT_MODEL_FILE: &str = "/config/hardwaremodel";

/// Where the agent takes its hardware model from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSpec {
    /// Model given directly.
    Static(String),
    /// Model read from a file.
    File(PathBuf),
}

impl ModelSpec {
    /// Build the matching model source.
    pub fn source(&self) -> Box<dyn ModelSource> {
        match self {
            ModelSpec::Static(model) => Box::new(StaticModel::new(model.clone())),
            ModelSpec::File(path) => Box::new(FileModel::new(path.clone())),
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Hardware model source.
    pub model: ModelSpec,

    /// Directory of the persistent bus. None keeps the bus in memory.
    pub data_dir: Option<PathBuf>,

    /// JSON file of records to publish at startup.
    pub seed_path: Option<PathBuf>,

    /// Stop as soon as the model's record is found.
    pub exit_when_found: bool,
}

impl AgentConfig {
    /// Create a configuration following the given model.
    pub fn new(model: ModelSpec) -> Self {
        Self {
            model,
            data_dir: None,
            seed_path: None,
            exit_when_found: false,
        }
    }

    /// Persist the bus under `dir`.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Publish the records in `path` at startup.
    pub fn with_seed(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_path = Some(path.into());
        self
    }

    /// Stop once the record is found.
    pub fn exit_when_found(mut self) -> Self {
        self.exit_when_found = true;
        self
    }

    /// Check if the bus is persistent.
    pub fn is_persistent(&self) -> bool {
        self.data_dir.is_some()
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(ModelSpec::File(PathBuf::from(DEFAULT_MODEL_FILE)))
    }
}

/// Command-line arguments for the agent.
#[derive(Parser, Debug)]
#[command(name = "adaptersync-agent")]
#[command(version, about = "Follow the assignable adapters of this device's model", long_about = None)]
pub struct Args {
    /// Hardware model name. Overrides --model-file.
    #[arg(short, long)]
    pub model: Option<String>,

    /// File holding the hardware model name.
    #[arg(long, default_value = DEFAULT_MODEL_FILE)]
    pub model_file: PathBuf,

    /// Directory for the persistent bus (in-memory when omitted).
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// JSON array of AssignableAdapters records to publish at startup.
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Exit once the model's record is found.
    #[arg(long)]
    pub exit_when_found: bool,
}

impl Args {
    /// Convert command-line arguments to agent configuration.
    pub fn into_config(self) -> AgentConfig {
        let model = match self.model {
            Some(model) => ModelSpec::Static(model),
            None => ModelSpec::File(self.model_file),
        };

        AgentConfig {
            model,
            data_dir: self.data_dir,
            seed_path: self.seed,
            exit_when_found: self.exit_when_found,
        }
    }
}
