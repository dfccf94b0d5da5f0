//! Correlation ids linking one invocation to its activity stream

use serde::{Deserialize, Serialize};

const SUFFIX_LEN: usize = 12;

/// Session identifier: `{agent_id}-{12 hex chars}`.
///
/// A fresh id is generated for every full generation and dropped once the
/// stream disconnects; ids are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate(agent_id: &str) -> Self {
        let fresh = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", agent_id, &fresh[..SUFFIX_LEN]))
    }

    /// Wrap an id received from elsewhere (e.g. a resumed CLI session).
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Agent id the session was generated for.
    pub fn agent_id(&self) -> &str {
        match self.0.rsplit_once('-') {
            Some((agent, suffix)) if suffix.len() == SUFFIX_LEN => agent,
            _ => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_scoped_and_fresh() {
        let a = SessionId::generate("698bcf88f0601df65d51cb31");
        let b = SessionId::generate("698bcf88f0601df65d51cb31");

        assert_ne!(a, b);
        assert!(a.as_str().starts_with("698bcf88f0601df65d51cb31-"));
        assert_eq!(a.as_str().len(), "698bcf88f0601df65d51cb31".len() + 1 + 12);
        assert_eq!(a.agent_id(), "698bcf88f0601df65d51cb31");
    }

    #[test]
    fn test_agent_id_with_dashes() {
        let id = SessionId::generate("post-writer");
        assert_eq!(id.agent_id(), "post-writer");

        let raw = SessionId::from_raw("opaque");
        assert_eq!(raw.agent_id(), "opaque");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = SessionId::from_raw("agent-0123456789ab");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"agent-0123456789ab\"");
    }
}
