//! Shared helpers for validating endpoint configuration

use anyhow::{bail, Context, Result};

const HTTP_SCHEMES: &[&str] = &["http://", "https://"];
const WS_SCHEMES: &[&str] = &["ws://", "wss://"];

/// Reject values that cannot travel in an HTTP header
/// (control characters, DEL, line breaks).
pub fn sanitize_for_header(value: &str, field_name: &str) -> Result<String> {
    if value.is_empty() {
        bail!("{} cannot be empty", field_name);
    }

    for (index, ch) in value.char_indices() {
        if ch.is_control() {
            bail!(
                "{} contains a control character at position {} ({:#06x})",
                field_name,
                index,
                ch as u32
            );
        }
    }

    Ok(value.to_string())
}

/// Validate an API key for the `x-api-key` header.
pub fn validate_api_key(api_key: &str) -> Result<String> {
    let trimmed = api_key.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        bail!("API key is empty or set to 'none'");
    }

    sanitize_for_header(trimmed, "API key")?;

    trimmed
        .parse::<reqwest::header::HeaderValue>()
        .with_context(|| {
            format!(
                "API key is not a valid header value ({} characters)",
                trimmed.len()
            )
        })?;

    Ok(trimmed.to_string())
}

/// Validate the invocation endpoint base URL (http/https).
pub fn sanitize_base_url(url: &str, field_name: &str) -> Result<String> {
    sanitize_url(url, field_name, HTTP_SCHEMES)
}

/// Validate the activity stream URL (ws/wss).
pub fn sanitize_stream_url(url: &str, field_name: &str) -> Result<String> {
    sanitize_url(url, field_name, WS_SCHEMES)
}

fn sanitize_url(url: &str, field_name: &str, schemes: &[&str]) -> Result<String> {
    let trimmed = url.trim();

    if trimmed.is_empty() {
        bail!("{} cannot be empty", field_name);
    }

    // Percent-encoded separators usually mean the value was encoded twice
    if trimmed.contains("%2F") || trimmed.contains("%3D") || trimmed.contains("%20") {
        bail!(
            "{} appears to contain URL-encoded characters (e.g. %2F, %3D, %20)",
            field_name
        );
    }

    if !schemes.iter().any(|scheme| trimmed.starts_with(scheme)) {
        bail!(
            "{} must start with one of {}. Got: {}",
            field_name,
            schemes.join(", "),
            trimmed
        );
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Join a base URL and a relative path with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.trim_end_matches('/').to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// First `max` characters of `text`, for log lines and error excerpts.
pub fn excerpt(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
