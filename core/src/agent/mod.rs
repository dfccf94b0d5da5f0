//! Hosted agent access
//!
//! - [`invoker`]: one request, one [`AgentResult`]
//! - [`response`]: decoding the agent-specific payload
//! - [`session`]: correlation ids for the activity stream
//! - [`catalog`]: the agents the studio knows about

pub mod catalog;
pub mod invoker;
pub mod response;
pub mod session;

pub use catalog::AgentRole;
pub use invoker::{AgentInvoker, AgentRequest, AgentResult, HttpAgentInvoker};
pub use response::{
    decode, decode_strict, extract_image, extract_post_text, AgentPayload, ContentBundle,
    ImageAsset, PostDraft,
};
pub use session::SessionId;
