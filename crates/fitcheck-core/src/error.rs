//! Error types for the session core.
//!
//! Generation failures are the only errors the session handles itself.
//! Storage problems degrade to "absent" and are logged, never returned.

use thiserror::Error;

/// Failure reported by an [`crate::ImageGenerator`] call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("request blocked by the image model: {reason}")]
    Blocked { reason: String },

    #[error("image model returned no image")]
    EmptyResponse,

    #[error("image model unavailable: {message}")]
    Unavailable { message: String },

    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Short explanation suitable for showing to the person using the app.
    fn user_detail(&self) -> String {
        match self {
            Self::Blocked { reason } => {
                format!("The image model declined this request ({reason}). Try a different garment or photo.")
            }
            Self::EmptyResponse => {
                "The image model did not return an image. Please try again.".to_string()
            }
            Self::Unavailable { message } => {
                format!("The image service is unavailable right now: {message}")
            }
            Self::Other(message) => message.clone(),
        }
    }
}

/// Errors returned by [`crate::SessionController`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{context}: {source}")]
    Generation {
        context: &'static str,
        #[source]
        source: GenerationError,
    },

    #[error("pose index {index} is out of range (catalog has {count} poses)")]
    PoseOutOfRange { index: usize, count: usize },
}

impl SessionError {
    pub(crate) fn garment(source: GenerationError) -> Self {
        Self::Generation {
            context: "Failed to apply garment",
            source,
        }
    }

    pub(crate) fn pose(source: GenerationError) -> Self {
        Self::Generation {
            context: "Failed to change pose",
            source,
        }
    }

    /// The message surfaced in the session's error state.
    pub fn friendly_message(&self) -> String {
        match self {
            Self::Generation { context, source } => {
                format!("{context}. {}", source.user_detail())
            }
            other => other.to_string(),
        }
    }
}
