use crate::services::style::StyleApplier;
use crate::trace_if_enabled;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

use super::easing::{ease_out, lerp};
use super::r#trait::{AnimationDriver, AnimationJob};

/// Interpolating driver: one ease-out frame per `frame_interval`, last frame
/// lands exactly on the target.
pub struct EasedDriver {
    frame_interval: Duration,
    current: Option<f64>,
    job: Option<AnimationJob>,
    next_frame: Option<Instant>,
}

impl EasedDriver {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            current: None,
            job: None,
            next_frame: None,
        }
    }

    fn paint(&mut self, value: f64, applier: &mut dyn StyleApplier) {
        if let Err(e) = applier.apply_opacity(value) {
            warn!("Failed to paint opacity {:.3}: {}", value, e);
        }
        self.current = Some(value);
    }

    fn frame_after(&self, now: Instant, job: &AnimationJob) -> Instant {
        (now + self.frame_interval).min(job.ends_at())
    }
}

impl AnimationDriver for EasedDriver {
    fn animate_to(
        &mut self,
        target: f64,
        duration: Duration,
        now: Instant,
        applier: &mut dyn StyleApplier,
    ) {
        self.cancel();

        // Nothing painted yet, nothing to interpolate from
        let Some(from) = self.current else {
            self.paint(target, applier);
            return;
        };

        if duration.is_zero() || from == target {
            self.paint(target, applier);
            return;
        }

        let job = AnimationJob {
            from_opacity: from,
            to_opacity: target,
            duration,
            started_at: now,
        };
        self.next_frame = Some(self.frame_after(now, &job));
        self.job = Some(job);
        trace_if_enabled!(
            "Animation started: {:.3} -> {:.3} over {}ms",
            from,
            target,
            duration.as_millis()
        );
    }

    fn tick(&mut self, now: Instant, applier: &mut dyn StyleApplier) {
        let Some(job) = self.job else {
            return;
        };
        match self.next_frame {
            Some(at) if at <= now => {}
            _ => return,
        }

        let progress = job.progress(now);
        if progress >= 1.0 {
            self.paint(job.to_opacity, applier);
            self.job = None;
            self.next_frame = None;
            trace_if_enabled!("Animation finished at {:.3}", job.to_opacity);
            return;
        }

        let value = lerp(job.from_opacity, job.to_opacity, ease_out(progress));
        self.paint(value, applier);
        self.next_frame = Some(self.frame_after(now, &job));
        trace_if_enabled!("Animation frame {:.3} ({:.0}%)", value, progress * 100.0);
    }

    fn cancel(&mut self) {
        self.job = None;
        self.next_frame = None;
    }

    fn current_opacity(&self) -> Option<f64> {
        self.current
    }

    fn next_frame_at(&self) -> Option<Instant> {
        self.next_frame
    }

    #[cfg(test)]
    fn active_job(&self) -> Option<AnimationJob> {
        self.job
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::style::RecordingApplier;

    const FRAME: Duration = Duration::from_millis(16);
    const DURATION: Duration = Duration::from_millis(300);

    /// Ticks at every requested frame until `until` or the job ends
    fn run_frames(driver: &mut EasedDriver, applier: &mut RecordingApplier, until: Instant) {
        while let Some(at) = driver.next_frame_at() {
            if at > until {
                break;
            }
            driver.tick(at, applier);
        }
    }

    fn painted_at_zero() -> (EasedDriver, RecordingApplier, Instant) {
        let mut driver = EasedDriver::new(FRAME);
        let mut applier = RecordingApplier::default();
        let start = Instant::now();
        driver.animate_to(0.0, DURATION, start, &mut applier);
        (driver, applier, start)
    }

    #[test]
    fn test_first_paint_is_immediate() {
        let (driver, applier, _) = painted_at_zero();
        assert_eq!(applier.painted(), vec![0.0]);
        assert_eq!(driver.current_opacity(), Some(0.0));
        assert!(!driver.is_animating());
    }

    #[test]
    fn test_zero_duration_applies_synchronously() {
        let (mut driver, mut applier, start) = painted_at_zero();
        driver.animate_to(0.85, Duration::ZERO, start, &mut applier);
        assert_eq!(applier.last(), Some(0.85));
        assert!(driver.active_job().is_none());
        assert!(driver.next_frame_at().is_none());
    }

    #[test]
    fn test_animation_ends_exactly_on_target() {
        let (mut driver, mut applier, start) = painted_at_zero();
        driver.animate_to(0.85, DURATION, start, &mut applier);
        assert!(driver.is_animating());

        run_frames(&mut driver, &mut applier, start + DURATION * 2);

        let painted = applier.painted();
        assert_eq!(painted.last().copied(), Some(0.85));
        assert_eq!(driver.current_opacity(), Some(0.85));
        assert!(driver.active_job().is_none());
        assert!(painted.windows(2).all(|w| w[1] >= w[0]), "{:?}", painted);
        assert!(painted.len() > 10);
    }

    #[test]
    fn test_last_frame_is_at_job_end() {
        let (mut driver, mut applier, start) = painted_at_zero();
        driver.animate_to(1.0, DURATION, start, &mut applier);

        let mut last_frame = start;
        while let Some(at) = driver.next_frame_at() {
            last_frame = at;
            driver.tick(at, &mut applier);
        }
        assert_eq!(last_frame, start + DURATION);
    }

    #[test]
    fn test_retarget_starts_from_painted_value() {
        let (mut driver, mut applier, start) = painted_at_zero();
        driver.animate_to(1.0, DURATION, start, &mut applier);
        run_frames(&mut driver, &mut applier, start + Duration::from_millis(100));

        let painted = driver.current_opacity().unwrap();
        assert!(painted > 0.0 && painted < 1.0);

        let retarget_at = start + Duration::from_millis(110);
        driver.animate_to(0.0, DURATION, retarget_at, &mut applier);
        let job = driver.active_job().unwrap();
        assert_eq!(job.from_opacity, painted);
        assert_eq!(job.to_opacity, 0.0);
        assert_eq!(job.started_at, retarget_at);

        let at = driver.next_frame_at().unwrap();
        driver.tick(at, &mut applier);
        assert!(applier.last().unwrap() < painted);

        run_frames(&mut driver, &mut applier, retarget_at + DURATION * 2);
        assert_eq!(driver.current_opacity(), Some(0.0));
    }

    #[test]
    fn test_cancel_keeps_last_painted_value() {
        let (mut driver, mut applier, start) = painted_at_zero();
        driver.animate_to(1.0, DURATION, start, &mut applier);
        run_frames(&mut driver, &mut applier, start + Duration::from_millis(50));
        let painted = driver.current_opacity().unwrap();

        driver.cancel();
        driver.cancel();
        let frames = applier.painted().len();
        driver.tick(start + DURATION, &mut applier);

        assert_eq!(driver.current_opacity(), Some(painted));
        assert_eq!(applier.painted().len(), frames);
        assert!(!driver.is_animating());
    }

    #[test]
    fn test_tick_before_frame_is_noop() {
        let (mut driver, mut applier, start) = painted_at_zero();
        driver.animate_to(1.0, DURATION, start, &mut applier);
        driver.tick(start + Duration::from_millis(1), &mut applier);
        assert_eq!(applier.painted(), vec![0.0]);
    }

    #[test]
    fn test_style_failure_does_not_stop_animation() {
        let (mut driver, mut applier, start) = painted_at_zero();
        applier.set_fail(true);
        driver.animate_to(1.0, DURATION, start, &mut applier);
        run_frames(&mut driver, &mut applier, start + DURATION);

        assert_eq!(driver.current_opacity(), Some(1.0));
        assert!(!driver.is_animating());

        applier.set_fail(false);
        driver.animate_to(0.5, Duration::ZERO, start + DURATION, &mut applier);
        assert_eq!(applier.last(), Some(0.5));
    }
}
