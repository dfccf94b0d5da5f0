//! Agent Invoker
//!
//! Sends one instruction to a hosted agent and folds every outcome into an
//! [`AgentResult`]. The invoker never looks inside the agent's payload;
//! see [`super::response`] for that.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client as HttpClient,
};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use super::session::SessionId;
use crate::config::BackendConfig;
use crate::error::{Result, StudioError};
use crate::util::{excerpt, join_url, sanitize_base_url, validate_api_key};

const API_KEY_HEADER: &str = "x-api-key";

/// One invocation: which agent, what to do, and which stream to report on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRequest {
    agent_id: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<SessionId>,
}

impl AgentRequest {
    pub fn new(agent_id: impl Into<String>, message: impl Into<String>) -> Result<Self> {
        let agent_id = agent_id.into();
        let message = message.into();

        if agent_id.trim().is_empty() {
            return Err(StudioError::InvalidInput {
                message: "agent id cannot be empty".to_string(),
            });
        }
        if message.trim().is_empty() {
            return Err(StudioError::InvalidInput {
                message: "message cannot be empty".to_string(),
            });
        }

        Ok(Self {
            agent_id,
            message,
            session_id: None,
        })
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }
}

/// Uniform envelope for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResult {
    pub success: bool,
    pub response: Option<Value>,
    pub error: Option<String>,
    failure: Option<StudioError>,
}

impl AgentResult {
    pub fn ok(response: Value) -> Self {
        Self {
            success: true,
            response: (!response.is_null()).then_some(response),
            error: None,
            failure: None,
        }
    }

    pub fn failed(error: StudioError) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error.to_string()),
            failure: Some(error),
        }
    }

    /// Typed cause when `success` is false.
    pub fn failure(&self) -> Option<&StudioError> {
        self.failure.as_ref()
    }

    pub fn into_result(self) -> Result<Option<Value>> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.response),
        }
    }
}

#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Perform exactly one call. Failures come back as `success == false`.
    async fn invoke(&self, request: AgentRequest) -> AgentResult;

    async fn invoke_message(
        &self,
        message: &str,
        agent_id: &str,
        session_id: Option<&SessionId>,
    ) -> AgentResult {
        match AgentRequest::new(agent_id, message) {
            Ok(request) => {
                let request = match session_id {
                    Some(session) => request.with_session(session.clone()),
                    None => request,
                };
                self.invoke(request).await
            }
            Err(err) => AgentResult::failed(err),
        }
    }
}

/// HTTP implementation posting JSON to the invocation endpoint.
pub struct HttpAgentInvoker {
    http_client: HttpClient,
    url: String,
    api_key: Option<String>,
}

impl HttpAgentInvoker {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let base_url = sanitize_base_url(&config.base_url, "backend.base_url")?;
        let api_key = config
            .api_key
            .as_deref()
            .map(validate_api_key)
            .transpose()?;

        let mut builder =
            HttpClient::builder().user_agent(concat!("studio/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http_client,
            url: join_url(&base_url, &config.invoke_path),
            api_key,
        })
    }

    /// Shared client, reused for image downloads.
    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(key).map_err(|e| StudioError::InvalidConfig {
                message: format!("API key is not a valid header value: {}", e),
            })?;
            headers.insert(API_KEY_HEADER, value);
        }
        Ok(headers)
    }

    async fn send(&self, request: &AgentRequest) -> Result<Value> {
        let headers = self.build_headers()?;
        let response = self
            .http_client
            .post(&self.url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| StudioError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| StudioError::Transport {
            message: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(StudioError::Backend {
                status: Some(status.as_u16()),
                message: format!("backend returned {}: {}", status, excerpt(&text, 200)),
            });
        }

        let body: Value = serde_json::from_str(&text).map_err(|e| StudioError::Backend {
            status: Some(status.as_u16()),
            message: format!("response is not JSON ({}): {}", e, excerpt(&text, 200)),
        })?;

        unwrap_envelope(body)
    }
}

#[async_trait]
impl AgentInvoker for HttpAgentInvoker {
    async fn invoke(&self, request: AgentRequest) -> AgentResult {
        crate::info_log!(
            "Invoking agent {} (session={}, message_len={})",
            request.agent_id(),
            request.session_id().map(SessionId::as_str).unwrap_or("-"),
            request.message().len()
        );

        let started = Instant::now();
        match self.send(&request).await {
            Ok(response) => {
                crate::info_log!(
                    "Agent {} answered in {:?}",
                    request.agent_id(),
                    started.elapsed()
                );
                AgentResult::ok(response)
            }
            Err(err) => {
                crate::error_log!(
                    "Agent {} failed after {:?}: {}",
                    request.agent_id(),
                    started.elapsed(),
                    err
                );
                AgentResult::failed(err)
            }
        }
    }
}

/// Strip the endpoint's `{success, response, error}` wrapper when present.
/// Bodies without a boolean `success` field are the agent payload itself.
fn unwrap_envelope(body: Value) -> Result<Value> {
    let Some(success) = body.get("success").and_then(Value::as_bool) else {
        return Ok(body);
    };

    if success {
        return Ok(body.get("response").cloned().unwrap_or(Value::Null));
    }

    let message = body
        .get("error")
        .and_then(|e| match e {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| "agent reported failure".to_string());

    Err(StudioError::Backend {
        status: None,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{refused_url, serve_once};
    use serde_json::json;

    fn invoker_for(base_url: &str) -> HttpAgentInvoker {
        let config = BackendConfig {
            base_url: base_url.to_string(),
            api_key: Some("sk-test".to_string()),
            ..BackendConfig::default()
        };
        HttpAgentInvoker::new(&config).unwrap()
    }

    #[test]
    fn test_request_rejects_blank_fields() {
        assert!(matches!(
            AgentRequest::new("agent", "   "),
            Err(StudioError::InvalidInput { .. })
        ));
        assert!(matches!(
            AgentRequest::new("", "hello"),
            Err(StudioError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let request = AgentRequest::new("agent-1", "Write something").unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"agent_id": "agent-1", "message": "Write something"})
        );

        let request = request.with_session(SessionId::from_raw("agent-1-abcdefabcdef"));
        assert_eq!(
            serde_json::to_value(&request).unwrap()["session_id"],
            json!("agent-1-abcdefabcdef")
        );
    }

    #[test]
    fn test_unwrap_envelope() {
        let payload = json!({"result": {"data": {"post_text": "hi"}}});
        assert_eq!(unwrap_envelope(payload.clone()).unwrap(), payload);

        let wrapped = json!({"success": true, "response": {"message": "done"}});
        assert_eq!(unwrap_envelope(wrapped).unwrap(), json!({"message": "done"}));

        let failed = json!({"success": false, "error": "agent crashed"});
        match unwrap_envelope(failed) {
            Err(StudioError::Backend { status, message }) => {
                assert_eq!(status, None);
                assert_eq!(message, "agent crashed");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invoke_success_posts_json() {
        let body = r#"{"result":{"data":{"linkedin_post":"Hello #World"}}}"#;
        let (url, server) = serve_once("200 OK", body).await;
        let invoker = invoker_for(&url);

        let session = SessionId::generate("coord");
        let result = invoker
            .invoke_message("Generate LinkedIn content", "coord", Some(&session))
            .await;

        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(
            result.response.unwrap()["result"]["data"]["linkedin_post"],
            "Hello #World"
        );

        let raw_request = server.await.unwrap();
        assert!(raw_request.starts_with("POST /api/agent "));
        assert!(raw_request.to_ascii_lowercase().contains("x-api-key: sk-test"));
        assert!(raw_request.contains(r#""agent_id":"coord""#));
        assert!(raw_request.contains(session.as_str()));
    }

    #[tokio::test]
    async fn test_invoke_non_2xx_is_backend_failure() {
        let (url, _server) = serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#).await;
        let result = invoker_for(&url).invoke_message("hi", "agent", None).await;

        assert!(!result.success);
        assert!(result.response.is_none());
        assert!(result.error.as_deref().unwrap().contains("500"));
        assert!(matches!(
            result.failure(),
            Some(StudioError::Backend { status: Some(500), .. })
        ));
    }

    #[tokio::test]
    async fn test_invoke_non_json_body_is_backend_failure() {
        let (url, _server) = serve_once("200 OK", "<html>oops</html>").await;
        let result = invoker_for(&url).invoke_message("hi", "agent", None).await;

        assert!(!result.success);
        assert!(matches!(result.failure(), Some(StudioError::Backend { .. })));
    }

    #[tokio::test]
    async fn test_invoke_transport_failure_does_not_panic() {
        let url = refused_url().await;
        let result = invoker_for(&url).invoke_message("hi", "agent", None).await;

        assert!(!result.success);
        assert!(matches!(result.failure(), Some(StudioError::Transport { .. })));
        assert!(result.into_result().is_err());
    }

    #[tokio::test]
    async fn test_invoke_blank_message_skips_network() {
        let url = refused_url().await;
        let result = invoker_for(&url).invoke_message("  ", "agent", None).await;
        assert!(matches!(
            result.failure(),
            Some(StudioError::InvalidInput { .. })
        ));
    }
}
