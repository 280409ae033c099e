//! Pure window-topology classification.
//!
//! No I/O, no timers: the same snapshot and settings always give the same
//! `Classification`, which makes this the table-testable heart of the panel logic.

use crate::config::PanelSettings;
use crate::events::{TopologySnapshot, WindowKind, WindowView};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelState {
    Transparent,
    SemiOpaque,
    Opaque,
}

impl PanelState {
    /// Opacity fraction configured for this state
    pub fn opacity(&self, settings: &PanelSettings) -> f64 {
        let percent = match self {
            PanelState::Transparent => settings.transparent_opacity,
            PanelState::SemiOpaque => settings.semi_opaque_opacity,
            PanelState::Opaque => settings.opaque_opacity,
        };
        percent as f64 / 100.0
    }
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PanelState::Transparent => "transparent",
            PanelState::SemiOpaque => "semi-opaque",
            PanelState::Opaque => "opaque",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub state: PanelState,
    pub opacity: f64,
    pub reason: String,
}

/// Static part of the "normal window" filter
#[derive(Debug, Clone, Default)]
pub struct ClassifierRules {
    shell_classes: Vec<String>,
}

impl ClassifierRules {
    pub fn new(shell_classes: Vec<String>) -> Self {
        Self { shell_classes }
    }

    pub fn is_shell_window(&self, window: &WindowView) -> bool {
        self.shell_classes.iter().any(|c| *c == window.class_tag)
    }

    /// Application window that counts towards the panel state
    pub fn is_normal(&self, window: &WindowView, primary_monitor: i32) -> bool {
        window.kind == WindowKind::Normal
            && !window.hidden
            && window.on_active_workspace
            && window.monitor_index == primary_monitor
            && !self.is_shell_window(window)
    }
}

pub fn classify(
    snapshot: &TopologySnapshot,
    settings: &PanelSettings,
    rules: &ClassifierRules,
) -> Classification {
    let primary = snapshot.primary_monitor;

    let normal: Vec<&WindowView> = snapshot
        .windows
        .iter()
        .filter(|w| rules.is_normal(w, primary))
        .collect();
    let visible: Vec<&WindowView> = normal.iter().copied().filter(|w| !w.minimized).collect();

    let has_fullscreen = visible.iter().any(|w| w.fullscreen);
    let has_opaque_maximized = settings.maximized_opaque
        && visible
            .iter()
            .any(|w| w.is_maximized() && w.monitor_index == primary);

    let (state, reason) = if has_fullscreen {
        (PanelState::Opaque, "fullscreen window present".to_string())
    } else if has_opaque_maximized {
        (PanelState::Opaque, "maximized window on primary monitor".to_string())
    } else if snapshot.global_fullscreen_on_primary {
        (PanelState::Opaque, "global fullscreen detected".to_string())
    } else if !visible.is_empty() {
        (
            PanelState::SemiOpaque,
            format!("{} visible windows present", visible.len()),
        )
    } else if !normal.is_empty() {
        (
            PanelState::Transparent,
            format!("all {} windows are minimized", normal.len()),
        )
    } else {
        (PanelState::Transparent, "no windows present".to_string())
    };

    Classification {
        state,
        opacity: state.opacity(settings),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ClassifierRules {
        ClassifierRules::new(vec!["gjs".to_string(), "gnome-shell".to_string()])
    }

    fn run(windows: Vec<WindowView>) -> Classification {
        classify(&TopologySnapshot::new(windows), &PanelSettings::default(), &rules())
    }

    #[test]
    fn test_empty_desktop_is_transparent() {
        let result = run(vec![]);
        assert_eq!(result.state, PanelState::Transparent);
        assert_eq!(result.opacity, 0.0);
        assert_eq!(result.reason, "no windows present");
    }

    #[test]
    fn test_single_visible_window_is_semi_opaque() {
        let result = run(vec![WindowView::new(1)]);
        assert_eq!(result.state, PanelState::SemiOpaque);
        assert_eq!(result.opacity, 0.85);
        assert_eq!(result.reason, "1 visible windows present");
    }

    #[test]
    fn test_fullscreen_overrides_semi_opaque() {
        let result = run(vec![
            WindowView::new(1),
            WindowView::new(2).fullscreen(true),
            WindowView::new(3),
        ]);
        assert_eq!(result.state, PanelState::Opaque);
        assert_eq!(result.opacity, 1.0);
        assert_eq!(result.reason, "fullscreen window present");
    }

    #[test]
    fn test_all_minimized_is_transparent() {
        let result = run(vec![
            WindowView::new(1).minimized(true),
            WindowView::new(2).minimized(true).fullscreen(true),
        ]);
        assert_eq!(result.state, PanelState::Transparent);
        assert_eq!(result.reason, "all 2 windows are minimized");
    }

    #[test]
    fn test_non_normal_windows_never_count() {
        let windows = vec![
            WindowView::new(1).with_kind(WindowKind::Other).fullscreen(true),
            WindowView::new(2).hidden(true).fullscreen(true),
            WindowView::new(3).on_active_workspace(false).fullscreen(true),
            WindowView::new(4).with_monitor(1).fullscreen(true),
            WindowView::new(5).with_class("gnome-shell").fullscreen(true),
            WindowView::new(6).with_class("gjs").maximized(true),
        ];
        let result = run(windows);
        assert_eq!(result.state, PanelState::Transparent);
        assert_eq!(result.reason, "no windows present");
    }

    #[test]
    fn test_maximized_respects_setting() {
        let snapshot = TopologySnapshot::new(vec![WindowView::new(1).maximized(true)]);

        let off = classify(&snapshot, &PanelSettings::default(), &rules());
        assert_eq!(off.state, PanelState::SemiOpaque);

        let settings = PanelSettings {
            maximized_opaque: true,
            ..PanelSettings::default()
        };
        let on = classify(&snapshot, &settings, &rules());
        assert_eq!(on.state, PanelState::Opaque);
        assert_eq!(on.reason, "maximized window on primary monitor");
    }

    #[test]
    fn test_minimized_maximized_window_does_not_make_opaque() {
        let settings = PanelSettings {
            maximized_opaque: true,
            ..PanelSettings::default()
        };
        let snapshot = TopologySnapshot::new(vec![
            WindowView::new(1).maximized(true).minimized(true),
            WindowView::new(2),
        ]);
        assert_eq!(classify(&snapshot, &settings, &rules()).state, PanelState::SemiOpaque);
    }

    #[test]
    fn test_global_fullscreen_is_opaque_even_without_windows() {
        let snapshot = TopologySnapshot::new(vec![]).with_global_fullscreen(true);
        let result = classify(&snapshot, &PanelSettings::default(), &rules());
        assert_eq!(result.state, PanelState::Opaque);
        assert_eq!(result.reason, "global fullscreen detected");
    }

    #[test]
    fn test_primary_monitor_is_taken_from_snapshot() {
        let snapshot = TopologySnapshot::new(vec![WindowView::new(1).with_monitor(2)])
            .with_primary_monitor(2);
        let result = classify(&snapshot, &PanelSettings::default(), &rules());
        assert_eq!(result.state, PanelState::SemiOpaque);
    }

    #[test]
    fn test_custom_opacities_are_fractions() {
        let settings = PanelSettings {
            transparent_opacity: 10,
            semi_opaque_opacity: 50,
            opaque_opacity: 95,
            ..PanelSettings::default()
        };
        let table = [
            (vec![], 0.10),
            (vec![WindowView::new(1)], 0.50),
            (vec![WindowView::new(1).fullscreen(true)], 0.95),
        ];
        for (windows, expected) in table {
            let result = classify(&TopologySnapshot::new(windows), &settings, &rules());
            assert!((result.opacity - expected).abs() < 1e-9, "{:?}", result);
        }
    }

    #[test]
    fn test_classification_is_deterministic() {
        let snapshot = TopologySnapshot::new(vec![
            WindowView::new(1).minimized(true),
            WindowView::new(2).maximized(true),
        ]);
        let settings = PanelSettings::default();
        let first = classify(&snapshot, &settings, &rules());
        let second = classify(&snapshot, &settings, &rules());
        assert_eq!(first, second);
    }
}
