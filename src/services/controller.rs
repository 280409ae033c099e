//! Panel controller: owns the panel state and runs the single event loop.
//!
//! Every timer (warm-up, debounce, duration settle, animation frames) is a
//! deadline held here, and every external notification arrives on a channel
//! drained by the same loop, so handlers never run concurrently.

use crate::config::{Config, PanelSettings, TimingConfig};
use crate::debug_if_enabled;
use crate::events::{SettingKey, SubscriptionHandle, TopologyEvent};
use crate::services::animation::AnimationDriver;
use crate::services::classifier::{classify, Classification, ClassifierRules, PanelState};
use crate::services::normalizer::EventNormalizer;
use crate::services::scheduler::{earliest, sleep_until_deadline, DebounceScheduler, OneShotTimer};
use crate::services::settings_store::{read_settings, SettingsSink, SettingsStore};
use crate::services::style::StyleApplier;
use crate::services::topology::{take_snapshot, WindowTopologySource};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Uninitialized,
    Running,
    /// Terminal: a stopped controller is never restarted
    Disabled,
}

pub struct PanelController {
    phase: ControllerPhase,
    timing: TimingConfig,
    rules: ClassifierRules,

    topology: Box<dyn WindowTopologySource>,
    settings: Box<dyn SettingsStore>,
    applier: Box<dyn StyleApplier>,
    driver: Box<dyn AnimationDriver>,

    normalizer: EventNormalizer,
    scheduler: DebounceScheduler,
    settle: OneShotTimer,

    topology_rx: mpsc::UnboundedReceiver<TopologyEvent>,
    settings_tx: SettingsSink,
    settings_rx: mpsc::UnboundedReceiver<SettingKey>,
    settings_handles: Vec<SubscriptionHandle>,

    current_state: Option<PanelState>,
    current_target: Option<f64>,
    original_style: Option<String>,
    debug: bool,
    degraded_logged: bool,
    recomputes: u64,
}

impl PanelController {
    pub fn new(
        config: &Config,
        topology: Box<dyn WindowTopologySource>,
        settings: Box<dyn SettingsStore>,
        applier: Box<dyn StyleApplier>,
        driver: Box<dyn AnimationDriver>,
    ) -> Self {
        let (topology_tx, topology_rx) = mpsc::unbounded_channel();
        let (settings_tx, settings_rx) = mpsc::unbounded_channel();

        Self {
            phase: ControllerPhase::Uninitialized,
            timing: config.timing.clone(),
            rules: ClassifierRules::new(config.classifier.shell_classes.clone()),
            topology,
            settings,
            applier,
            driver,
            normalizer: EventNormalizer::new(topology_tx),
            scheduler: DebounceScheduler::new(),
            settle: OneShotTimer::default(),
            topology_rx,
            settings_tx,
            settings_rx,
            settings_handles: Vec::new(),
            current_state: None,
            current_target: None,
            original_style: None,
            debug: false,
            degraded_logged: false,
            recomputes: 0,
        }
    }

    /// Subscribes to settings and topology, schedules the first classification
    /// after the warm-up delay and records the panel's current style.
    ///
    /// Never fails: whatever could not be attached is logged and left out.
    pub fn start(&mut self) {
        if self.phase != ControllerPhase::Uninitialized {
            warn!("Panel controller cannot start from {:?}", self.phase);
            return;
        }

        self.refresh_settings();

        for key in SettingKey::ALL {
            match self.settings.subscribe_to_change(key, self.settings_tx.clone()) {
                Ok(handle) => self.settings_handles.push(handle),
                Err(e) => warn!("No change notifications for '{}': {}", key, e),
            }
        }

        self.normalizer.attach_source(self.topology.as_mut());
        self.scheduler
            .schedule_debounced(self.timing.warm_up(), Instant::now());

        match self.applier.current_style() {
            Ok(style) => self.original_style = Some(style),
            Err(e) => warn!("Original panel style not recorded: {}", e),
        }

        self.phase = ControllerPhase::Running;
        info!(
            "Panel controller started ({} settings subscriptions, {} windows attached, first update in {}ms)",
            self.settings_handles.len(),
            self.normalizer.attached_count(),
            self.timing.warm_up_ms
        );
    }

    /// Cancels timers and animation, releases every subscription and puts the
    /// original style back. Safe to call at any point, including twice.
    pub fn stop(&mut self) {
        if self.phase == ControllerPhase::Disabled {
            return;
        }

        self.scheduler.cancel();
        self.settle.disarm();
        if self.driver.is_animating() {
            info!("Cancelling in-flight panel animation");
        }
        self.driver.cancel();
        self.normalizer.teardown_all(self.topology.as_mut());

        for handle in self.settings_handles.drain(..) {
            if let Err(e) = self.settings.unsubscribe(handle) {
                warn!("Failed to unsubscribe settings handle {:?}: {}", handle, e);
            }
        }

        if let Some(style) = self.original_style.take() {
            if let Err(e) = self.applier.restore_style(&style) {
                warn!("Failed to restore original panel style: {}", e);
            }
        }

        self.current_state = None;
        self.current_target = None;
        self.phase = ControllerPhase::Disabled;
        info!("Panel controller stopped");
    }

    /// Runs the event loop until `shutdown` resolves or the controller stops
    pub async fn run_until<F: Future<Output = ()>>(&mut self, shutdown: F) {
        tokio::pin!(shutdown);

        while self.phase == ControllerPhase::Running {
            let wake_at = earliest([
                self.scheduler.deadline(),
                self.settle.deadline(),
                self.driver.next_frame_at(),
            ]);

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                Some(event) = self.topology_rx.recv() => {
                    self.handle_topology_event(event, Instant::now());
                }
                Some(key) = self.settings_rx.recv() => {
                    self.handle_setting_change(key, Instant::now());
                }
                _ = sleep_until_deadline(wake_at) => {
                    self.on_timers(Instant::now());
                }
            }
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn current_state(&self) -> Option<PanelState> {
        self.current_state
    }

    /// Opacity last painted on the panel
    #[cfg(test)]
    pub fn current_opacity(&self) -> Option<f64> {
        self.driver.current_opacity()
    }

    #[cfg(test)]
    pub fn driver(&self) -> &dyn AnimationDriver {
        self.driver.as_ref()
    }

    /// Number of classifications run so far
    #[cfg(test)]
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    fn handle_topology_event(&mut self, event: TopologyEvent, now: Instant) {
        if self.phase != ControllerPhase::Running {
            return;
        }
        let request = self.normalizer.normalize(event, self.topology.as_mut());
        let rescheduled = self.scheduler.is_pending();
        self.scheduler
            .schedule_debounced(self.timing.quiet_window(), now);
        debug_if_enabled!(
            self.debug,
            "Update {} in {}ms ({:?})",
            if rescheduled { "rescheduled" } else { "scheduled" },
            self.timing.quiet_window_ms,
            request.cause
        );
    }

    fn handle_setting_change(&mut self, key: SettingKey, now: Instant) {
        if self.phase != ControllerPhase::Running {
            return;
        }
        let settings = self.refresh_settings();

        match key {
            key if key.affects_opacity() => {
                debug_if_enabled!(self.debug, "Setting '{}' changed, forcing panel update", key);
                self.scheduler.schedule_immediate(now);
                self.fire_due(now);
            }
            SettingKey::AnimationDuration => self.handle_duration_change(&settings, now),
            _ => debug_if_enabled!(self.debug, "Setting '{}' changed", key),
        }
    }

    /// Retimes the current state with the new duration without reclassifying
    fn handle_duration_change(&mut self, settings: &PanelSettings, now: Instant) {
        self.settle.disarm();
        debug_if_enabled!(
            self.debug,
            "Animation duration changed to {}ms",
            settings.animation_duration
        );

        if self.current_state.is_none() {
            return;
        }
        if settings.animation_duration == 0 {
            self.retime(now);
        } else {
            self.settle.arm(now + self.timing.settle());
        }
    }

    fn on_timers(&mut self, now: Instant) {
        self.fire_due(now);
        if self.settle.take_due(now) {
            self.retime(now);
        }
        self.driver.tick(now, self.applier.as_mut());
    }

    fn fire_due(&mut self, now: Instant) {
        if let Some(firing) = self.scheduler.poll_fire(now) {
            self.recompute(firing.force, now);
        }
    }

    fn recompute(&mut self, force: bool, now: Instant) {
        if self.topology.is_overview_visible() {
            debug_if_enabled!(self.debug, "Overview is visible, skipping update");
            return;
        }

        let settings = self.refresh_settings();
        let snapshot = take_snapshot(self.topology.as_ref(), self.debug);
        let classification = classify(&snapshot, &settings, &self.rules);
        self.recomputes += 1;

        debug_if_enabled!(
            self.debug,
            cycle = self.recomputes,
            windows = snapshot.windows.len(),
            state = %classification.state,
            "Classification: {}",
            classification.reason
        );
        self.apply_classification(classification, &settings, force, now);
    }

    fn apply_classification(
        &mut self,
        classification: Classification,
        settings: &PanelSettings,
        force: bool,
        now: Instant,
    ) {
        let Classification {
            state,
            opacity,
            reason,
        } = classification;
        let state_changed = self.current_state != Some(state);
        let opacity_changed = self.current_target != Some(opacity);

        if !state_changed && !opacity_changed && !force {
            debug_if_enabled!(self.debug, "No change needed: {} at {:.2}", state, opacity);
            return;
        }

        if state_changed {
            debug_if_enabled!(
                self.debug,
                "State changed: {} -> {} ({})",
                self.current_state
                    .map_or_else(|| "none".to_string(), |s| s.to_string()),
                state,
                reason
            );
        } else if opacity_changed {
            debug_if_enabled!(
                self.debug,
                "Opacity changed for {} state: {:.2} -> {:.2}",
                state,
                self.current_target.unwrap_or_default(),
                opacity
            );
        } else {
            debug_if_enabled!(self.debug, "Force updating {} state ({})", state, reason);
        }

        self.current_state = Some(state);
        self.current_target = Some(opacity);
        self.driver
            .animate_to(opacity, settings.animation_duration(), now, self.applier.as_mut());
    }

    fn retime(&mut self, now: Instant) {
        let Some(state) = self.current_state else {
            return;
        };
        let settings = self.refresh_settings();
        let target = state.opacity(&settings);
        debug_if_enabled!(
            self.debug,
            "Retiming {} state: {:?} -> {:.2} over {}ms",
            state,
            self.driver.current_opacity(),
            target,
            settings.animation_duration
        );

        self.current_target = Some(target);
        self.driver
            .animate_to(target, settings.animation_duration(), now, self.applier.as_mut());
    }

    /// Fresh settings snapshot; a degraded store is reported once
    fn refresh_settings(&mut self) -> PanelSettings {
        let (settings, failures) = read_settings(self.settings.as_ref());

        if !failures.is_empty() && !self.degraded_logged {
            self.degraded_logged = true;
            for (key, e) in &failures {
                warn!("Using default for '{}': {}", key, e);
            }
        }

        self.debug = settings.debug_logging;
        self.normalizer.set_debug(self.debug);
        settings
    }
}

impl Drop for PanelController {
    fn drop(&mut self) {
        self.stop();
    }
}
