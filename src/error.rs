use crate::events::WindowId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Configuration unavailable: {0}")]
    ConfigurationUnavailable(String),

    #[error("Window {window} attributes unreadable: {reason}")]
    WindowAttributeUnreadable { window: WindowId, reason: String },

    #[error("Failed to apply panel style: {0}")]
    StyleApplicationFailed(String),

    #[error("Subscription failed: {0}")]
    SubscriptionFailure(String),

    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl PanelError {
    pub fn window_unreadable<T>(window: WindowId, reason: impl Into<String>) -> Result<T> {
        Err(PanelError::WindowAttributeUnreadable {
            window,
            reason: reason.into(),
        })
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;

#[macro_export]
macro_rules! panel_error {
    (configuration_unavailable, $($arg:tt)*) => {
        $crate::error::PanelError::ConfigurationUnavailable(format!($($arg)*))
    };
    (style, $($arg:tt)*) => {
        $crate::error::PanelError::StyleApplicationFailed(format!($($arg)*))
    };
    (subscription, $($arg:tt)*) => {
        $crate::error::PanelError::SubscriptionFailure(format!($($arg)*))
    };
}
