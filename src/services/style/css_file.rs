use crate::error::Result;
use crate::panel_error;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

use super::r#trait::{panel_style, StyleApplier};

/// Writes the panel style as a one-rule stylesheet.
///
/// Meant for bars that reload their stylesheet when it changes on disk.
pub struct CssFileStyleApplier {
    path: PathBuf,
    selector: String,
}

impl CssFileStyleApplier {
    pub fn new(path: PathBuf, selector: &str) -> Self {
        info!("Panel style output: {:?} (selector '{}')", path, selector);
        Self {
            path,
            selector: selector.to_string(),
        }
    }

    fn write(&self, contents: &str) -> Result<()> {
        fs::write(&self.path, contents)
            .map_err(|e| panel_error!(style, "cannot write {:?}: {}", self.path, e))
    }
}

impl StyleApplier for CssFileStyleApplier {
    fn apply_opacity(&mut self, opacity: f64) -> Result<()> {
        let css = format!("{} {{ {} }}\n", self.selector, panel_style(opacity));
        self.write(&css)?;
        debug!("Panel stylesheet updated: {}", css.trim_end());
        Ok(())
    }

    fn current_style(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(panel_error!(style, "cannot read {:?}: {}", self.path, e)),
        }
    }

    fn restore_style(&mut self, style: &str) -> Result<()> {
        self.write(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.css");
        fs::write(&path, "#panel { color: red; }\n").unwrap();

        let mut applier = CssFileStyleApplier::new(path.clone(), "#panel");
        let original = applier.current_style().unwrap();

        applier.apply_opacity(0.5).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "#panel { background-color: rgba(45, 45, 45, 0.5) !important; }\n"
        );

        applier.restore_style(&original).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "#panel { color: red; }\n");
    }

    #[test]
    fn test_missing_file_has_empty_style() {
        let dir = tempfile::tempdir().unwrap();
        let applier = CssFileStyleApplier::new(dir.path().join("absent.css"), "#panel");
        assert_eq!(applier.current_style().unwrap(), "");
    }

    #[test]
    fn test_unwritable_path_is_style_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut applier =
            CssFileStyleApplier::new(dir.path().join("no-such-dir").join("panel.css"), "#panel");
        let err = applier.apply_opacity(1.0).unwrap_err();
        assert!(matches!(err, crate::error::PanelError::StyleApplicationFailed(_)));
    }
}
