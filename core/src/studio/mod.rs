//! The content studio: form, generation controller, and export
//!
//! - [`form`]: topic, tone and image style, plus the instruction wording
//! - [`state`]: the in-flight action and the content on display
//! - [`controller`]: [`Studio`], which runs generate and regenerate actions
//! - [`export`]: clipboard and image download

pub mod controller;
pub mod export;
pub mod form;
pub mod state;

pub use controller::Studio;
pub use export::{copy_to_clipboard, default_image_path, download_image, DEFAULT_IMAGE_FILE};
pub use form::{ContentForm, ImageStyle, Tone};
pub use state::{ActionState, GeneratedContent, Outcome};
