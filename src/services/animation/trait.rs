use crate::config::{AnimationConfig, AnimationMode};
use crate::services::style::StyleApplier;
use std::time::Duration;
use tokio::time::Instant;

/// The single in-flight transition of a driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationJob {
    pub from_opacity: f64,
    pub to_opacity: f64,
    pub duration: Duration,
    pub started_at: Instant,
}

impl AnimationJob {
    pub fn ends_at(&self) -> Instant {
        self.started_at + self.duration
    }

    /// Elapsed fraction of the job at `now`, within 0.0..=1.0
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

/// Moves the painted opacity to a target, painting through a `StyleApplier`.
///
/// Implementations own at most one `AnimationJob`. Style failures are logged and
/// swallowed; the painted value is still recorded so the next request starts
/// from where the panel is supposed to be.
pub trait AnimationDriver: Send {
    /// Starts moving towards `target`, superseding any in-flight job.
    /// A zero `duration` paints `target` before returning.
    fn animate_to(
        &mut self,
        target: f64,
        duration: Duration,
        now: Instant,
        applier: &mut dyn StyleApplier,
    );

    /// Paints the frame due at `now`, if any
    fn tick(&mut self, now: Instant, applier: &mut dyn StyleApplier);

    /// Stops ticking and leaves the last painted value in place
    fn cancel(&mut self);

    /// Value last painted, `None` before the first paint
    fn current_opacity(&self) -> Option<f64>;

    /// When the next frame is due, `None` while idle
    fn next_frame_at(&self) -> Option<Instant>;

    #[cfg(test)]
    fn active_job(&self) -> Option<AnimationJob> {
        None
    }

    fn is_animating(&self) -> bool {
        self.next_frame_at().is_some()
    }
}

/// Factory function to create the driver selected by `[animation].mode`
pub fn create_animation_driver(config: &AnimationConfig) -> Box<dyn AnimationDriver> {
    match config.mode {
        AnimationMode::Eased => Box::new(super::eased::EasedDriver::new(config.frame_interval())),
        AnimationMode::Immediate => Box::new(super::immediate::ImmediateDriver::new()),
    }
}
