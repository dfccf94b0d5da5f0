//! What the studio is doing and what it has produced

use serde::{Deserialize, Serialize};

use crate::agent::AgentRole;

/// The single in-flight action, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    #[default]
    Idle,
    Generating,
    RegeneratingPost,
    RegeneratingImage,
}

impl ActionState {
    pub fn is_busy(&self) -> bool {
        !matches!(self, ActionState::Idle)
    }

    /// Agent doing the work for this action
    pub fn agent(&self) -> Option<AgentRole> {
        match self {
            ActionState::Idle => None,
            ActionState::Generating => Some(AgentRole::ContentCoordinator),
            ActionState::RegeneratingPost => Some(AgentRole::PostWriter),
            ActionState::RegeneratingImage => Some(AgentRole::ImageCreator),
        }
    }

    /// Progress line shown while the action runs
    pub fn status_text(&self) -> Option<&'static str> {
        match self {
            ActionState::Idle => None,
            ActionState::Generating => Some("Coordinating content generation..."),
            ActionState::RegeneratingPost => Some("Writing new post..."),
            ActionState::RegeneratingImage => Some("Creating new image..."),
        }
    }
}

impl std::fmt::Display for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionState::Idle => write!(f, "idle"),
            ActionState::Generating => write!(f, "generate"),
            ActionState::RegeneratingPost => write!(f, "regenerate post"),
            ActionState::RegeneratingImage => write!(f, "regenerate image"),
        }
    }
}

/// Post and image currently on display. `None` means nothing to show;
/// an empty string is a value the agent actually returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub post: Option<String>,
    pub image_url: Option<String>,
    pub image_description: Option<String>,
}

impl GeneratedContent {
    pub fn is_empty(&self) -> bool {
        self.post.is_none() && self.image_url.is_none()
    }
}

/// Result of a completed action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Whether displayed content changed
    pub updated: bool,
}
