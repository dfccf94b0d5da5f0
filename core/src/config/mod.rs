//! Configuration management
//!
//! A single TOML file (`~/.config/studio/config.toml` on Linux) plus
//! `STUDIO_*` environment overrides.

pub mod store;

pub use store::{AgentIds, BackendConfig, Config, StreamConfig};

#[cfg(test)]
mod tests;
