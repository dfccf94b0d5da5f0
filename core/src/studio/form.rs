//! Form state and the instructions sent to each agent

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

/// Writing tone requested from the agents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Professional,
    Inspirational,
    Educational,
    Conversational,
    Bold,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Professional,
        Tone::Inspirational,
        Tone::Educational,
        Tone::Conversational,
        Tone::Bold,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tone::Professional => "Professional",
            Tone::Inspirational => "Inspirational",
            Tone::Educational => "Educational",
            Tone::Conversational => "Conversational",
            Tone::Bold => "Bold",
        }
    }
}

impl std::str::FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Tone::ALL
            .into_iter()
            .find(|tone| tone.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "Unknown tone: {} (expected one of {})",
                    s,
                    Tone::ALL.map(|t| t.label()).join(", ")
                )
            })
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Visual style requested from the image agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageStyle {
    #[default]
    Minimal,
    Abstract,
    Illustrated,
    PhotoRealistic,
}

impl ImageStyle {
    pub const ALL: [ImageStyle; 4] = [
        ImageStyle::Minimal,
        ImageStyle::Abstract,
        ImageStyle::Illustrated,
        ImageStyle::PhotoRealistic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ImageStyle::Minimal => "Minimal",
            ImageStyle::Abstract => "Abstract",
            ImageStyle::Illustrated => "Illustrated",
            ImageStyle::PhotoRealistic => "Photo-realistic",
        }
    }
}

impl std::str::FromStr for ImageStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        // Accept "photo realistic" and "photorealistic" too
        let normalized: String = wanted
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        ImageStyle::ALL
            .into_iter()
            .find(|style| {
                let label: String = style.label().chars().filter(|c| *c != '-').collect();
                label.eq_ignore_ascii_case(&normalized)
            })
            .ok_or_else(|| {
                format!(
                    "Unknown image style: {} (expected one of {})",
                    s,
                    ImageStyle::ALL.map(|st| st.label()).join(", ")
                )
            })
    }
}

impl std::fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// What the user asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentForm {
    pub topic: String,
    pub tone: Tone,
    pub style: ImageStyle,
}

impl ContentForm {
    pub fn new(topic: impl Into<String>, tone: Tone, style: ImageStyle) -> Self {
        Self {
            topic: topic.into(),
            tone,
            style,
        }
    }

    /// Topic with surrounding whitespace removed; blank is an error.
    pub fn topic(&self) -> Result<&str> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(StudioError::InvalidInput {
                message: "topic must not be empty".to_string(),
            });
        }
        Ok(topic)
    }

    /// Instruction for the content coordinator.
    pub fn generate_instruction(&self) -> Result<String> {
        Ok(format!(
            "Generate LinkedIn content for: Topic: {}. Tone: {}. Image Style: {}.",
            self.topic()?,
            self.tone,
            self.style
        ))
    }

    /// Instruction for the post writer.
    pub fn post_instruction(&self) -> Result<String> {
        Ok(format!(
            "Create a LinkedIn post about {}. Tone: {}.",
            self.topic()?,
            self.tone
        ))
    }

    /// Instruction for the image creator.
    pub fn image_instruction(&self) -> Result<String> {
        Ok(format!(
            "Generate a professional LinkedIn image with {} style representing {}. \
             Use vibrant but professional colors suitable for LinkedIn.",
            self.style,
            self.topic()?
        ))
    }
}

pub const SAMPLE_TOPIC: &str = "Launching my new AI-powered productivity tool for remote teams that helps automate daily standup meetings, track project progress, and generate insights from team communication patterns.";

pub const SAMPLE_POST: &str = "Today marks a milestone in my journey—I'm thrilled to announce the launch of my new AI-powered productivity tool designed specifically for remote teams!\n\nWhen the world shifted to remote work, collaboration and productivity found new challenges. I saw talented teams struggle to stay aligned and organized, even as they worked tirelessly from different corners of the globe. This sparked a vision—to create an AI tool that not only streamlines workflows but truly *empowers* teams to reach their highest potential, no matter where they are.\n\nOur tool leverages the latest in artificial intelligence to automate repetitive tasks, surface insights from daily communications, and foster seamless collaboration. The goal? To give every team member more time for what matters: creative problem-solving, meaningful connections, and delivering results.\n\nI believe the future of work is not just remote, but *connected, intelligent, and human-centric*. With the right technology, we can make distributed teamwork more effective—and more fulfilling—than ever before.\n\nI'd love to hear from you:\nHow do you see AI changing the way your team works? What features would make a real difference for you?\n\nLet's start a conversation and redefine productivity together.\n\n#AI #RemoteWork #Productivity #Innovation #FutureOfWork";

pub const SAMPLE_IMAGE_URL: &str = "https://url-shortner.studio.lyzr.ai/87e71c4e";

pub const SAMPLE_IMAGE_DESCRIPTION: &str = "Abstract visual representing AI-powered productivity for remote teams—dynamic interconnected shapes, vibrant energy flows symbolizing collaboration, innovation, and digital progress.";

pub const SAMPLE_TONE: Tone = Tone::Inspirational;
pub const SAMPLE_STYLE: ImageStyle = ImageStyle::Abstract;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_parsing_is_case_insensitive() {
        assert_eq!("bold".parse::<Tone>().unwrap(), Tone::Bold);
        assert_eq!(" EDUCATIONAL ".parse::<Tone>().unwrap(), Tone::Educational);
        let err = "snarky".parse::<Tone>().unwrap_err();
        assert!(err.contains("Conversational"));
    }

    #[test]
    fn test_style_parsing_accepts_spelling_variants() {
        assert_eq!(
            "photo-realistic".parse::<ImageStyle>().unwrap(),
            ImageStyle::PhotoRealistic
        );
        assert_eq!(
            "Photo Realistic".parse::<ImageStyle>().unwrap(),
            ImageStyle::PhotoRealistic
        );
        assert_eq!("abstract".parse::<ImageStyle>().unwrap(), ImageStyle::Abstract);
        assert!("watercolor".parse::<ImageStyle>().is_err());
        assert_eq!(ImageStyle::PhotoRealistic.to_string(), "Photo-realistic");
    }

    #[test]
    fn test_defaults() {
        let form = ContentForm::default();
        assert_eq!(form.tone, Tone::Professional);
        assert_eq!(form.style, ImageStyle::Minimal);
        assert!(form.topic().is_err());
    }

    #[test]
    fn test_instructions_wording() {
        let form = ContentForm::new("  remote onboarding ", Tone::Bold, ImageStyle::PhotoRealistic);

        assert_eq!(
            form.generate_instruction().unwrap(),
            "Generate LinkedIn content for: Topic: remote onboarding. Tone: Bold. Image Style: Photo-realistic."
        );
        assert_eq!(
            form.post_instruction().unwrap(),
            "Create a LinkedIn post about remote onboarding. Tone: Bold."
        );
        assert_eq!(
            form.image_instruction().unwrap(),
            "Generate a professional LinkedIn image with Photo-realistic style representing remote onboarding. Use vibrant but professional colors suitable for LinkedIn."
        );
    }

    #[test]
    fn test_blank_topic_is_invalid_input() {
        let form = ContentForm::new(" \n\t", Tone::default(), ImageStyle::default());
        assert!(matches!(
            form.generate_instruction(),
            Err(StudioError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_sample_post_ends_with_hashtags() {
        assert!(SAMPLE_POST.ends_with("#AI #RemoteWork #Productivity #Innovation #FutureOfWork"));
        assert!(SAMPLE_POST.chars().count() < 3000);
    }
}
