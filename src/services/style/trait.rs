use crate::error::Result;
use std::path::PathBuf;

/// Renders a panel opacity on the host surface
pub trait StyleApplier: Send {
    /// Paints `opacity` (0.0..=1.0)
    fn apply_opacity(&mut self, opacity: f64) -> Result<()>;

    /// Style the surface carries right now, recorded at start for restoration
    fn current_style(&self) -> Result<String>;

    /// Puts a previously recorded style back
    fn restore_style(&mut self, style: &str) -> Result<()>;
}

/// Style declaration for the panel background at `opacity`
pub fn panel_style(opacity: f64) -> String {
    format!(
        "background-color: rgba(45, 45, 45, {}) !important;",
        format_opacity(opacity)
    )
}

/// Up to three decimals, trailing zeros dropped
pub fn format_opacity(opacity: f64) -> String {
    let text = format!("{:.3}", opacity.clamp(0.0, 1.0));
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

/// Factory: log-only applier for dry runs, stylesheet file otherwise
pub fn create_style_applier(
    output: Option<PathBuf>,
    selector: &str,
    dry_run: bool,
) -> Result<Box<dyn StyleApplier>> {
    match output {
        Some(path) if !dry_run => Ok(Box::new(super::css_file::CssFileStyleApplier::new(
            path, selector,
        ))),
        _ => Ok(Box::new(super::dry_run::LoggingStyleApplier::new())),
    }
}
