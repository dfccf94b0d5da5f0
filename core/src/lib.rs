pub mod agent;
pub mod config;
pub mod error;
pub mod logger;
pub mod output;
pub mod stream;
pub mod studio;
pub mod util;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use agent::{AgentInvoker, AgentRole, HttpAgentInvoker, SessionId};
pub use config::Config;
pub use error::{Result, StudioError};
pub use stream::{ActivityStreamClient, WebSocketTransport};
pub use studio::Studio;
