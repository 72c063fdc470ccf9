//! adaptersync device agent.
//!
//! Resolves the device's hardware model, subscribes to that model's
//! assignable adapters and keeps them current until shut down.

pub mod agent;
pub mod config;
pub mod error;
pub mod seed;

pub use agent::{Agent, RunOutcome};
pub use config::{AgentConfig, Args, ModelSpec};
pub use error::Error;
