//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for breakout.
#[derive(Debug, thiserror::Error)]
pub enum BreakoutError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid price {price} on {date}: fill price must be positive and finite")]
    InvalidPrice { price: f64, date: NaiveDate },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no bars in {path}")]
    NoData { path: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BreakoutError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        BreakoutError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&BreakoutError> for std::process::ExitCode {
    fn from(err: &BreakoutError) -> Self {
        let code: u8 = match err {
            BreakoutError::Io(_) => 1,
            BreakoutError::ConfigParse { .. }
            | BreakoutError::ConfigMissing { .. }
            | BreakoutError::ConfigInvalid { .. } => 2,
            BreakoutError::Data { .. } | BreakoutError::NoData { .. } => 3,
            BreakoutError::InvalidPrice { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
