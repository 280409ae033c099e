use crate::services::style::StyleApplier;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

use super::r#trait::AnimationDriver;

/// Paints every target as soon as it is requested, whatever the duration
#[derive(Debug, Default)]
pub struct ImmediateDriver {
    current: Option<f64>,
}

impl ImmediateDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnimationDriver for ImmediateDriver {
    fn animate_to(
        &mut self,
        target: f64,
        _duration: Duration,
        _now: Instant,
        applier: &mut dyn StyleApplier,
    ) {
        if let Err(e) = applier.apply_opacity(target) {
            warn!("Failed to paint opacity {:.3}: {}", target, e);
        }
        self.current = Some(target);
    }

    fn tick(&mut self, _now: Instant, _applier: &mut dyn StyleApplier) {}

    fn cancel(&mut self) {}

    fn current_opacity(&self) -> Option<f64> {
        self.current
    }

    fn next_frame_at(&self) -> Option<Instant> {
        None
    }
}
