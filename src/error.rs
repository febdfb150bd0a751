use thiserror::Error;

/// A simulation parameter that cannot be run with.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid parameter `{field}`: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse parameters: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write frame: {0}")]
    Image(#[from] image::ImageError),

    #[error("cannot {action} while simulation is {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error("render error: {0}")]
    Render(String),
}
