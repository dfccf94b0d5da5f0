//! Agent response decoding
//!
//! Each hosted agent answers with its own JSON schema. [`decode`] maps a
//! payload onto one of the known shapes, trying them in a fixed order:
//!
//! 1. `result.data.linkedin_post` / `image_url` / `image_description` (coordinator)
//! 2. `result.data.post_text` (post writer)
//! 3. `module_outputs.image_output` (image creator)
//! 4. `module_outputs.artifact_files[0].file_url`
//! 5. `result.post_text`, `result.text`, `message`, `text`, or a string payload
//!
//! Anything else is [`AgentPayload::Unrecognized`]. [`decode_strict`] turns
//! that case into [`StudioError::ShapeMismatch`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Result, StudioError};
use crate::util::excerpt;

/// Paths searched by [`extract_post_text`], highest priority first.
pub const POST_TEXT_PATHS: &[&str] = &[
    "/result/data/linkedin_post",
    "/result/data/post_text",
    "/result/post_text",
    "/result/text",
    "/message",
    "/text",
];

/// Coordinator output: post plus matching image.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContentBundle {
    #[serde(rename = "linkedin_post", deserialize_with = "lenient_string")]
    pub post: String,
    #[serde(deserialize_with = "lenient_string")]
    pub image_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub image_description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub tone_used: String,
    #[serde(deserialize_with = "lenient_string")]
    pub style_used: String,
    #[serde(deserialize_with = "lenient_string")]
    pub coherence_notes: String,
}

/// Post writer output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PostDraft {
    #[serde(deserialize_with = "lenient_string")]
    pub post_text: String,
    pub character_count: Option<u64>,
    #[serde(deserialize_with = "lenient_string")]
    pub tone: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImageAsset {
    #[serde(deserialize_with = "lenient_string")]
    pub image_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub image_description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentPayload {
    ContentBundle(ContentBundle),
    PostDraft(PostDraft),
    ImageOutput(ImageAsset),
    ArtifactFile { file_url: String },
    Message { text: String },
    Unrecognized,
}

impl AgentPayload {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, AgentPayload::Unrecognized)
    }

    /// Post text carried by this shape, if any.
    pub fn post_text(&self) -> Option<&str> {
        match self {
            AgentPayload::ContentBundle(bundle) => Some(&bundle.post),
            AgentPayload::PostDraft(draft) => Some(&draft.post_text),
            AgentPayload::Message { text } => Some(text),
            _ => None,
        }
    }

    /// Image carried by this shape, if any.
    pub fn image(&self) -> Option<ImageAsset> {
        match self {
            AgentPayload::ContentBundle(bundle) => Some(ImageAsset {
                image_url: bundle.image_url.clone(),
                image_description: bundle.image_description.clone(),
            }),
            AgentPayload::ImageOutput(asset) => Some(asset.clone()),
            AgentPayload::ArtifactFile { file_url } => Some(ImageAsset {
                image_url: file_url.clone(),
                image_description: String::new(),
            }),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AgentPayload::ContentBundle(_) => "content_bundle",
            AgentPayload::PostDraft(_) => "post_draft",
            AgentPayload::ImageOutput(_) => "image_output",
            AgentPayload::ArtifactFile { .. } => "artifact_file",
            AgentPayload::Message { .. } => "message",
            AgentPayload::Unrecognized => "unrecognized",
        }
    }
}

/// Tolerant decode: unknown shapes become [`AgentPayload::Unrecognized`].
pub fn decode(value: &Value) -> AgentPayload {
    match value {
        Value::String(text) => decode_text(text),
        Value::Object(_) => decode_object(value),
        _ => AgentPayload::Unrecognized,
    }
}

/// Strict decode: unknown shapes are an error.
pub fn decode_strict(value: &Value) -> Result<AgentPayload> {
    match decode(value) {
        AgentPayload::Unrecognized => Err(StudioError::ShapeMismatch {
            detail: excerpt(&value.to_string(), 160),
        }),
        payload => Ok(payload),
    }
}

/// Post text by priority; empty when no path carries a string.
pub fn extract_post_text(value: &Value) -> String {
    if let Value::String(text) = value {
        return decode_text(text).post_text().unwrap_or_default().to_string();
    }

    if let Some(text) = POST_TEXT_PATHS
        .iter()
        .find_map(|path| value.pointer(path).and_then(Value::as_str))
    {
        return text.to_string();
    }

    match value.get("response") {
        Some(inner @ Value::String(_)) => extract_post_text(inner),
        _ => String::new(),
    }
}

/// Image by priority: coordinator data, image output, first artifact.
pub fn extract_image(value: &Value) -> Option<ImageAsset> {
    decode(value).image().filter(|asset| !asset.image_url.is_empty())
}

fn decode_text(text: &str) -> AgentPayload {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return AgentPayload::Unrecognized;
    }

    // Some agents double-encode their JSON payload
    if trimmed.starts_with('{') {
        if let Ok(inner @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
            return decode_object(&inner);
        }
    }

    AgentPayload::Message {
        text: text.to_string(),
    }
}

fn decode_object(value: &Value) -> AgentPayload {
    if let Some(data) = value.pointer("/result/data").filter(|d| d.is_object()) {
        if data.get("linkedin_post").is_some()
            || (data.get("post_text").is_none()
                && (data.get("image_url").is_some() || data.get("image_description").is_some()))
        {
            if let Ok(bundle) = ContentBundle::deserialize(data) {
                return AgentPayload::ContentBundle(bundle);
            }
        }
        if data.get("post_text").is_some() {
            if let Ok(draft) = PostDraft::deserialize(data) {
                return AgentPayload::PostDraft(draft);
            }
        }
    }

    if let Some(image) = value
        .pointer("/module_outputs/image_output")
        .filter(|v| v.is_object())
    {
        if let Ok(asset) = ImageAsset::deserialize(image) {
            if !asset.image_url.is_empty() {
                return AgentPayload::ImageOutput(asset);
            }
        }
    }

    if let Some(file_url) = value
        .pointer("/module_outputs/artifact_files/0/file_url")
        .and_then(Value::as_str)
    {
        return AgentPayload::ArtifactFile {
            file_url: file_url.to_string(),
        };
    }

    if let Some(text) = POST_TEXT_PATHS[2..]
        .iter()
        .find_map(|path| value.pointer(path).and_then(Value::as_str))
    {
        return AgentPayload::Message {
            text: text.to_string(),
        };
    }

    if let Some(Value::String(inner)) = value.get("response") {
        return decode_text(inner);
    }

    AgentPayload::Unrecognized
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    })
}
