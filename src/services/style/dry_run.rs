use crate::error::Result;
use tracing::{debug, info};

use super::r#trait::{panel_style, StyleApplier};

/// Dry-run applier: keeps the style in memory and logs it
pub struct LoggingStyleApplier {
    style: String,
}

impl LoggingStyleApplier {
    pub fn new() -> Self {
        info!("Dry-run mode: panel styles are logged, not applied");
        Self {
            style: String::new(),
        }
    }
}

impl StyleApplier for LoggingStyleApplier {
    fn apply_opacity(&mut self, opacity: f64) -> Result<()> {
        self.style = panel_style(opacity);
        debug!("[DRY RUN] panel style: {}", self.style);
        Ok(())
    }

    fn current_style(&self) -> Result<String> {
        Ok(self.style.clone())
    }

    fn restore_style(&mut self, style: &str) -> Result<()> {
        info!("[DRY RUN] restoring panel style: {:?}", style);
        self.style = style.to_string();
        Ok(())
    }
}
