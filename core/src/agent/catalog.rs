//! The three hosted agents the studio talks to

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Produces post, image and description in one call
    ContentCoordinator,
    PostWriter,
    ImageCreator,
}

impl AgentRole {
    pub const ALL: [AgentRole; 3] = [
        AgentRole::ContentCoordinator,
        AgentRole::PostWriter,
        AgentRole::ImageCreator,
    ];

    /// Label shown while the agent is working
    pub fn label(&self) -> &'static str {
        match self {
            AgentRole::ContentCoordinator => "Content Coordinator",
            AgentRole::PostWriter => "Post Writer Agent",
            AgentRole::ImageCreator => "Image Creator Agent",
        }
    }

    /// Id of the agent in the hosted deployment
    pub fn default_id(&self) -> &'static str {
        match self {
            AgentRole::ContentCoordinator => "698bcf88f0601df65d51cb31",
            AgentRole::PostWriter => "698bcf5971cc26621aa010f0",
            AgentRole::ImageCreator => "698bcf70f0601df65d51cb30",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
