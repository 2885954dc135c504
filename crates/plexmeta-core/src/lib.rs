pub mod change;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod overrides;
pub mod resolver;
