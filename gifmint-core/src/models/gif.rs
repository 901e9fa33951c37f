//! Generation requests and history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of the generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Description of the image to synthesize.
    pub prompt: String,
    /// Text overlaid on the animation (may be empty).
    #[serde(default)]
    pub text: String,
}

impl GenerateRequest {
    /// Creates a request without overlay text.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            text: String::new(),
        }
    }

    /// Sets the overlay text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// Response of the generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedGif {
    /// Absolute address of the generated GIF.
    pub gif_url: String,
}

/// A previously generated GIF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifRecord {
    /// Backend ID.
    pub id: u64,
    /// The prompt used.
    pub prompt: String,
    /// The overlay text used, if any.
    #[serde(default)]
    pub overlay_text: Option<String>,
    /// Absolute address of the GIF (absent when the backend cannot build one).
    #[serde(default)]
    pub gif_url: Option<String>,
    /// When the GIF was generated.
    pub created_at: DateTime<Utc>,
}
