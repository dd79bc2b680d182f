//! WebSocket configuration

use serde::Deserialize;

use super::error::ValidationError;

/// WebSocket configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// Maximum inbound frame size in bytes
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl WebSocketConfig {
    /// Validate WebSocket configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Oversized limits defeat the point of having one.
        if self.max_frame_bytes == 0 || self.max_frame_bytes > 1024 * 1024 {
            return Err(ValidationError::InvalidFrameLimit);
        }
        Ok(())
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

fn default_max_frame_bytes() -> usize {
    64 * 1024
}
