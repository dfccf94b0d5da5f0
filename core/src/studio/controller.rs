//! Generation controller
//!
//! [`Studio`] owns the form, the content on display, and the single
//! in-flight action. A full generation opens the activity stream for a
//! fresh session, calls the content coordinator, and closes the stream
//! after a grace delay whatever the outcome. Regenerating the post or the
//! image calls the dedicated agent without a session and only replaces
//! content when the agent actually returned some.

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::form::{self, ContentForm, ImageStyle, Tone};
use super::state::{ActionState, GeneratedContent, Outcome};
use crate::agent::{
    decode, decode_strict, extract_image, extract_post_text, AgentInvoker, AgentPayload,
    AgentResult, AgentRole, HttpAgentInvoker, SessionId,
};
use crate::config::{AgentIds, Config};
use crate::error::{Result, StudioError};
use crate::stream::{ActivityStreamClient, StreamTransport, WebSocketTransport};
use crate::util::excerpt;

#[derive(Default)]
struct Inner {
    form: ContentForm,
    content: GeneratedContent,
    last_error: Option<StudioError>,
    session: Option<SessionId>,
}

/// Resets the action state when an action ends, including on early return.
struct ActionGuard {
    action: Arc<watch::Sender<ActionState>>,
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.action.send_replace(ActionState::Idle);
    }
}

pub struct Studio<I: AgentInvoker, T: StreamTransport> {
    invoker: I,
    stream: ActivityStreamClient<T>,
    agents: AgentIds,
    grace: Duration,
    strict: bool,
    inner: Mutex<Inner>,
    action: Arc<watch::Sender<ActionState>>,
}

impl Studio<HttpAgentInvoker, WebSocketTransport> {
    /// HTTP invoker and WebSocket activity stream as configured.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let invoker = HttpAgentInvoker::new(&config.backend)?;
        let transport = WebSocketTransport::new(&config.stream.url)?;
        Ok(Self::new(invoker, ActivityStreamClient::new(transport), config))
    }
}

impl<I: AgentInvoker, T: StreamTransport> Studio<I, T> {
    pub fn new(invoker: I, stream: ActivityStreamClient<T>, config: &Config) -> Self {
        let (action, _) = watch::channel(ActionState::Idle);
        Self {
            invoker,
            stream,
            agents: config.agents.clone(),
            grace: config.stream.disconnect_grace(),
            strict: config.strict_decoding,
            inner: Mutex::new(Inner::default()),
            action: Arc::new(action),
        }
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    pub fn stream(&self) -> &ActivityStreamClient<T> {
        &self.stream
    }

    // ---------------------------------------------------------------------
    // Form
    // ---------------------------------------------------------------------

    pub fn form(&self) -> ContentForm {
        self.inner.lock().form.clone()
    }

    pub fn set_form(&self, form: ContentForm) {
        self.inner.lock().form = form;
    }

    pub fn set_topic(&self, topic: impl Into<String>) {
        self.inner.lock().form.topic = topic.into();
    }

    pub fn set_tone(&self, tone: Tone) {
        self.inner.lock().form.tone = tone;
    }

    pub fn set_style(&self, style: ImageStyle) {
        self.inner.lock().form.style = style;
    }

    // ---------------------------------------------------------------------
    // Observers
    // ---------------------------------------------------------------------

    pub fn content(&self) -> GeneratedContent {
        self.inner.lock().content.clone()
    }

    /// Error from the most recent action. Cleared when an action succeeds.
    pub fn last_error(&self) -> Option<StudioError> {
        self.inner.lock().last_error.clone()
    }

    /// Session of the most recent full generation.
    pub fn session(&self) -> Option<SessionId> {
        self.inner.lock().session.clone()
    }

    pub fn action_state(&self) -> ActionState {
        *self.action.borrow()
    }

    pub fn watch_action(&self) -> watch::Receiver<ActionState> {
        self.action.subscribe()
    }

    /// Label of the agent working right now.
    pub fn active_agent(&self) -> Option<&'static str> {
        self.action_state().agent().map(|role| role.label())
    }

    // ---------------------------------------------------------------------
    // Actions
    // ---------------------------------------------------------------------

    /// Ask the content coordinator for a post and a matching image.
    ///
    /// Clears the displayed content first; on failure it stays cleared.
    pub async fn generate(&self) -> Result<Outcome> {
        let _guard = self.begin(ActionState::Generating)?;
        let message = match self.form().generate_instruction() {
            Ok(message) => message,
            Err(err) => return self.settle(Err(err)),
        };

        {
            let mut inner = self.inner.lock();
            inner.content = GeneratedContent::default();
            inner.last_error = None;
        }

        let agent_id = self.agents.for_role(AgentRole::ContentCoordinator);
        let session = SessionId::generate(agent_id);
        self.inner.lock().session = Some(session.clone());
        self.stream.connect(session.clone());

        crate::info_log!("Generating content in session {}", session);
        let result = self
            .invoker
            .invoke_message(&message, agent_id, Some(&session))
            .await;
        let applied = self.apply_generation(result);

        self.stream.disconnect_after(self.grace);
        self.settle(applied)
    }

    /// Ask the post writer for a new post. The image is left alone.
    pub async fn regenerate_post(&self) -> Result<Outcome> {
        let _guard = self.begin(ActionState::RegeneratingPost)?;
        let message = match self.form().post_instruction() {
            Ok(message) => message,
            Err(err) => return self.settle(Err(err)),
        };

        let agent_id = self.agents.for_role(AgentRole::PostWriter);
        let result = self.invoker.invoke_message(&message, agent_id, None).await;
        let applied = self.apply_post(result);
        self.settle(applied)
    }

    /// Ask the image creator for a new image. The post is left alone.
    pub async fn regenerate_image(&self) -> Result<Outcome> {
        let _guard = self.begin(ActionState::RegeneratingImage)?;
        let message = match self.form().image_instruction() {
            Ok(message) => message,
            Err(err) => return self.settle(Err(err)),
        };

        let agent_id = self.agents.for_role(AgentRole::ImageCreator);
        let result = self.invoker.invoke_message(&message, agent_id, None).await;
        let applied = self.apply_image(result);
        self.settle(applied)
    }

    /// Fill the form and preview with the bundled example.
    pub fn load_sample(&self) -> Result<()> {
        self.ensure_idle()?;
        let mut inner = self.inner.lock();
        inner.form = ContentForm::new(form::SAMPLE_TOPIC, form::SAMPLE_TONE, form::SAMPLE_STYLE);
        inner.content = GeneratedContent {
            post: Some(form::SAMPLE_POST.to_string()),
            image_url: Some(form::SAMPLE_IMAGE_URL.to_string()),
            image_description: Some(form::SAMPLE_IMAGE_DESCRIPTION.to_string()),
        };
        inner.last_error = None;
        Ok(())
    }

    /// Back to an empty form and preview.
    pub fn clear(&self) -> Result<()> {
        self.ensure_idle()?;
        *self.inner.lock() = Inner::default();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn ensure_idle(&self) -> Result<()> {
        let current = self.action_state();
        if current.is_busy() {
            return Err(StudioError::Busy {
                action: current.to_string(),
            });
        }
        Ok(())
    }

    fn begin(&self, next: ActionState) -> Result<ActionGuard> {
        let mut running = None;
        self.action.send_if_modified(|state| {
            if state.is_busy() {
                running = Some(*state);
                false
            } else {
                *state = next;
                true
            }
        });

        match running {
            Some(current) => Err(StudioError::Busy {
                action: current.to_string(),
            }),
            None => Ok(ActionGuard {
                action: self.action.clone(),
            }),
        }
    }

    fn settle(&self, applied: Result<bool>) -> Result<Outcome> {
        match applied {
            Ok(updated) => {
                self.inner.lock().last_error = None;
                Ok(Outcome { updated })
            }
            Err(err) => {
                crate::error_log!("{} failed: {}", self.action_state(), err);
                self.inner.lock().last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Unwrap a result into its payload; `None` when the agent said nothing.
    fn payload(&self, result: AgentResult, role: AgentRole) -> Result<Option<Value>> {
        let value = result.into_result()?;
        if value.is_none() {
            crate::warn_log!("{} returned an empty response", role.label());
        }
        Ok(value)
    }

    fn decode(&self, value: &Value, role: AgentRole) -> Result<AgentPayload> {
        if self.strict {
            return decode_strict(value);
        }
        let payload = decode(value);
        if !payload.is_recognized() {
            crate::warn_log!(
                "Unrecognized response from {}: {}",
                role.label(),
                excerpt(&value.to_string(), 200)
            );
        }
        Ok(payload)
    }

    fn apply_generation(&self, result: AgentResult) -> Result<bool> {
        let role = AgentRole::ContentCoordinator;
        let Some(value) = self.payload(result, role)? else {
            return Ok(false);
        };

        let payload = self.decode(&value, role)?;
        crate::debug_log!("Coordinator answered with {}", payload.kind());
        match &payload {
            AgentPayload::ContentBundle(_)
            | AgentPayload::PostDraft(_)
            | AgentPayload::ImageOutput(_)
            | AgentPayload::ArtifactFile { .. } => {
                let mut inner = self.inner.lock();
                if let Some(post) = payload.post_text() {
                    inner.content.post = Some(post.to_string());
                }
                if let Some(image) = payload.image() {
                    inner.content.image_url = Some(image.image_url);
                    inner.content.image_description = Some(image.image_description);
                }
                Ok(true)
            }
            AgentPayload::Message { text } => {
                crate::info_log!("Coordinator replied without content: {}", excerpt(text, 120));
                Ok(false)
            }
            AgentPayload::Unrecognized => Ok(false),
        }
    }

    fn apply_post(&self, result: AgentResult) -> Result<bool> {
        let role = AgentRole::PostWriter;
        let Some(value) = self.payload(result, role)? else {
            return Ok(false);
        };
        self.decode(&value, role)?;

        let text = extract_post_text(&value);
        if text.trim().is_empty() {
            crate::info_log!("{} returned no post text", role.label());
            return Ok(false);
        }
        self.inner.lock().content.post = Some(text);
        Ok(true)
    }

    fn apply_image(&self, result: AgentResult) -> Result<bool> {
        let role = AgentRole::ImageCreator;
        let Some(value) = self.payload(result, role)? else {
            return Ok(false);
        };
        self.decode(&value, role)?;

        match extract_image(&value) {
            Some(image) => {
                let mut inner = self.inner.lock();
                inner.content.image_url = Some(image.image_url);
                inner.content.image_description = Some(image.image_description);
                Ok(true)
            }
            None => {
                crate::info_log!("{} returned no image", role.label());
                Ok(false)
            }
        }
    }
}
