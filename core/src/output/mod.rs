//! Output formatting module
//!
//! Turns generated content, activity events and action state into
//! terminal text using colored output.

use chrono::Local;
use console::Style;
use lazy_static::lazy_static;
use regex::Regex;

use crate::stream::{ActivityEvent, EventKind, StreamStatus};
use crate::studio::{ActionState, GeneratedContent};

/// Maximum post length LinkedIn accepts
pub const LINKEDIN_CHAR_LIMIT: usize = 3000;

pub const EMPTY_PREVIEW_TITLE: &str = "Ready to Create";
pub const EMPTY_PREVIEW_HINT: &str =
    "Enter a topic, pick a tone and an image style, then generate your LinkedIn content.";
pub const OVER_LIMIT_WARNING: &str =
    "Post exceeds LinkedIn's character limit. Consider regenerating with a shorter topic.";

lazy_static! {
    static ref HASHTAG: Regex = Regex::new(r"(?-u:#\w+)").expect("valid regex");
}

/// A run of post text, hashtags split out for highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostToken {
    Text(String),
    Hashtag(String),
}

impl PostToken {
    pub fn as_str(&self) -> &str {
        match self {
            PostToken::Text(text) | PostToken::Hashtag(text) => text,
        }
    }
}

/// Split `text` into plain runs and `#word` hashtags. Hashtag words are
/// ASCII letters, digits and `_`. Concatenating the tokens gives back the
/// input.
pub fn tokenize_post(text: &str) -> Vec<PostToken> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for found in HASHTAG.find_iter(text) {
        if found.start() > last {
            tokens.push(PostToken::Text(text[last..found.start()].to_string()));
        }
        tokens.push(PostToken::Hashtag(found.as_str().to_string()));
        last = found.end();
    }
    if last < text.len() {
        tokens.push(PostToken::Text(text[last..].to_string()));
    }
    tokens
}

/// Characters in the post as the user sees them.
pub fn character_count(text: &str) -> usize {
    text.chars().count()
}

pub fn is_over_limit(text: &str) -> bool {
    character_count(text) > LINKEDIN_CHAR_LIMIT
}

/// Output formatter for CLI results
pub struct OutputFormatter {
    // Styles
    accent: Style,
    green: Style,
    yellow: Style,
    red: Style,
    dim: Style,
    bold: Style,
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self {
            accent: Style::new().cyan().bold(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            dim: Style::new().dim(),
            bold: Style::new().bold(),
        }
    }
}

impl OutputFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatter that never emits escape codes
    pub fn plain() -> Self {
        Self {
            accent: Style::new(),
            green: Style::new(),
            yellow: Style::new(),
            red: Style::new(),
            dim: Style::new(),
            bold: Style::new(),
        }
    }

    /// Post body with hashtags highlighted
    pub fn format_post(&self, text: &str) -> String {
        tokenize_post(text)
            .iter()
            .map(|token| match token {
                PostToken::Text(text) => text.clone(),
                PostToken::Hashtag(tag) => self.accent.apply_to(tag).to_string(),
            })
            .collect()
    }

    /// `count / limit`, red when over the limit
    pub fn format_char_badge(&self, text: &str) -> String {
        let badge = format!("{} / {}", character_count(text), LINKEDIN_CHAR_LIMIT);
        if is_over_limit(text) {
            self.red.apply_to(badge).to_string()
        } else {
            self.dim.apply_to(badge).to_string()
        }
    }

    /// `[HH:MM:SS] agent · message`
    pub fn format_event(&self, event: &ActivityEvent) -> String {
        let time = event.timestamp.with_timezone(&Local).format("%H:%M:%S");
        let message = match event.kind {
            EventKind::Error => self.red.apply_to(&event.message).to_string(),
            EventKind::Progress => self.yellow.apply_to(&event.message).to_string(),
            EventKind::Info => event.message.clone(),
        };
        match &event.agent {
            Some(agent) => format!(
                "{} {} · {}",
                self.dim.apply_to(format!("[{}]", time)),
                self.bold.apply_to(agent),
                message
            ),
            None => format!("{} {}", self.dim.apply_to(format!("[{}]", time)), message),
        }
    }

    /// Agent label and progress text while an action runs
    pub fn format_action(&self, state: ActionState) -> Option<String> {
        let status = state.status_text()?;
        let agent = state
            .agent()
            .map(|role| role.label())
            .unwrap_or("Processing");
        Some(format!("{} {}", self.bold.apply_to(agent), self.dim.apply_to(status)))
    }

    pub fn format_stream_status(&self, status: StreamStatus) -> String {
        let label = status.to_string();
        match status {
            StreamStatus::Connected => self.green.apply_to(label).to_string(),
            StreamStatus::Connecting => self.yellow.apply_to(label).to_string(),
            StreamStatus::Error => self.red.apply_to(label).to_string(),
            StreamStatus::Disconnected => self.dim.apply_to(label).to_string(),
        }
    }

    /// Full preview: post, badge, warning, image
    pub fn format_content(&self, content: &GeneratedContent) -> String {
        if content.is_empty() {
            return format!(
                "{}\n{}\n",
                self.bold.apply_to(EMPTY_PREVIEW_TITLE),
                self.dim.apply_to(EMPTY_PREVIEW_HINT)
            );
        }

        let mut out = String::new();
        if let Some(post) = &content.post {
            out.push_str(&format!(
                "{}  {}\n\n",
                self.bold.apply_to("LinkedIn Post"),
                self.format_char_badge(post)
            ));
            out.push_str(&self.format_post(post));
            out.push('\n');
            if is_over_limit(post) {
                out.push_str(&format!("\n{}\n", self.red.apply_to(OVER_LIMIT_WARNING)));
            }
        }

        if let Some(url) = content.image_url.as_deref().filter(|u| !u.is_empty()) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("{}\n", self.bold.apply_to("Generated Image")));
            out.push_str(&format!("{}\n", self.accent.apply_to(url)));
            if let Some(description) = content
                .image_description
                .as_deref()
                .filter(|d| !d.is_empty())
            {
                out.push_str(&format!("{}\n", self.dim.apply_to(description)));
            }
        }
        out
    }

    pub fn print_content(&self, content: &GeneratedContent) {
        println!();
        print!("{}", self.format_content(content));
    }

    pub fn print_event(&self, event: &ActivityEvent) {
        println!("{}", self.format_event(event));
    }

    /// Print the activity panel
    pub fn print_activity(&self, events: &[ActivityEvent], status: StreamStatus) {
        if events.is_empty() {
            return;
        }
        println!();
        println!(
            "{} ({})",
            self.bold.apply_to("Activity Stream"),
            self.format_stream_status(status)
        );
        for event in events {
            self.print_event(event);
        }
    }

    pub fn print_action(&self, state: ActionState) {
        if let Some(line) = self.format_action(state) {
            println!("{}", line);
        }
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", self.red.apply_to("Error:"), message);
    }

    pub fn print_success(&self, message: &str) {
        println!("{}", self.green.apply_to(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn hashtags(text: &str) -> Vec<String> {
        tokenize_post(text)
            .into_iter()
            .filter_map(|token| match token {
                PostToken::Hashtag(tag) => Some(tag),
                PostToken::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_tokenize_hello_world() {
        assert_eq!(
            tokenize_post("Hello #World"),
            vec![
                PostToken::Text("Hello ".to_string()),
                PostToken::Hashtag("#World".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_preserves_text() {
        let post = "Launch day!\n\n#AI #RemoteWork, and #Future_Of_Work2. Not a tag: # alone";
        let joined: String = tokenize_post(post).iter().map(PostToken::as_str).collect();

        assert_eq!(joined, post);
        assert_eq!(hashtags(post), vec!["#AI", "#RemoteWork", "#Future_Of_Work2"]);
    }

    #[test]
    fn test_tokenize_edges() {
        assert!(tokenize_post("").is_empty());
        assert_eq!(hashtags("#start middle #end"), vec!["#start", "#end"]);
        assert_eq!(
            tokenize_post("no tags here"),
            vec![PostToken::Text("no tags here".to_string())]
        );
    }

    #[test]
    fn test_hashtag_stops_at_non_ascii() {
        assert_eq!(
            tokenize_post("Paris #café time"),
            vec![
                PostToken::Text("Paris ".to_string()),
                PostToken::Hashtag("#caf".to_string()),
                PostToken::Text("é time".to_string()),
            ]
        );
        assert!(hashtags("#日本").is_empty());
    }

    #[test]
    fn test_character_limit() {
        let at_limit = "a".repeat(LINKEDIN_CHAR_LIMIT);
        assert!(!is_over_limit(&at_limit));
        assert!(is_over_limit(&format!("{}!", at_limit)));
        // Counted in characters, not bytes
        assert_eq!(character_count("café ☕"), 6);
    }

    #[test]
    fn test_empty_preview() {
        let out = OutputFormatter::plain().format_content(&GeneratedContent::default());
        assert!(out.starts_with(EMPTY_PREVIEW_TITLE));
    }

    #[test]
    fn test_content_preview() {
        let content = GeneratedContent {
            post: Some("Hello #World".to_string()),
            image_url: Some("http://i".to_string()),
            image_description: Some("d".to_string()),
        };
        let out = OutputFormatter::plain().format_content(&content);

        assert!(out.contains("12 / 3000"));
        assert!(out.contains("Hello #World\n"));
        assert!(out.contains("http://i\nd\n"));
        assert!(!out.contains(OVER_LIMIT_WARNING));
    }

    #[test]
    fn test_over_limit_warning() {
        let content = GeneratedContent {
            post: Some("x".repeat(LINKEDIN_CHAR_LIMIT + 1)),
            ..Default::default()
        };
        let out = OutputFormatter::plain().format_content(&content);
        assert!(out.contains("3001 / 3000"));
        assert!(out.contains(OVER_LIMIT_WARNING));
        assert!(!out.contains("Generated Image"));
    }

    #[test]
    fn test_event_line() {
        let timestamp = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        let time = timestamp.with_timezone(&Local).format("%H:%M:%S").to_string();
        let formatter = OutputFormatter::plain();

        let event = ActivityEvent::new(EventKind::Progress, "Drafting hook")
            .with_agent("Post Writer Agent")
            .with_timestamp(timestamp);
        assert_eq!(
            formatter.format_event(&event),
            format!("[{}] Post Writer Agent · Drafting hook", time)
        );

        let event = ActivityEvent::new(EventKind::Info, "connected").with_timestamp(timestamp);
        assert_eq!(formatter.format_event(&event), format!("[{}] connected", time));
    }

    #[test]
    fn test_action_line() {
        let formatter = OutputFormatter::plain();
        assert_eq!(formatter.format_action(ActionState::Idle), None);
        assert_eq!(
            formatter.format_action(ActionState::RegeneratingPost).unwrap(),
            "Post Writer Agent Writing new post..."
        );
    }
}
