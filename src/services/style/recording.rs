use crate::error::Result;
use crate::panel_error;
use crate::services::style::StyleApplier;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Recorded {
    painted: Vec<f64>,
    fail: bool,
    original: String,
    restored: Option<String>,
}

/// Records every painted value; clones share the same record
#[derive(Debug, Clone, Default)]
pub struct RecordingApplier {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingApplier {
    pub fn with_original(style: &str) -> Self {
        let applier = Self::default();
        applier.inner.lock().original = style.to_string();
        applier
    }

    pub fn painted(&self) -> Vec<f64> {
        self.inner.lock().painted.clone()
    }

    pub fn last(&self) -> Option<f64> {
        self.inner.lock().painted.last().copied()
    }

    pub fn set_fail(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }

    pub fn restored(&self) -> Option<String> {
        self.inner.lock().restored.clone()
    }
}

impl StyleApplier for RecordingApplier {
    fn apply_opacity(&mut self, opacity: f64) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.fail {
            return Err(panel_error!(style, "surface gone"));
        }
        inner.painted.push(opacity);
        Ok(())
    }

    fn current_style(&self) -> Result<String> {
        Ok(self.inner.lock().original.clone())
    }

    fn restore_style(&mut self, style: &str) -> Result<()> {
        self.inner.lock().restored = Some(style.to_string());
        Ok(())
    }
}
