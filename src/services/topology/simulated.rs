use crate::error::{PanelError, Result};
use crate::events::{
    SubscriptionHandle, TopologyEvent, TopologyEventKind, WindowId, WindowProperty, WindowView,
    WorkspaceId,
};
use crate::panel_error;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use super::r#trait::{TopologySink, WindowTopologySource};

#[derive(Debug, Clone)]
struct SimWindow {
    view: WindowView,
    workspace: WorkspaceId,
}

#[derive(Default)]
struct SimState {
    windows: BTreeMap<WindowId, SimWindow>,
    active_workspace: u32,
    primary_monitor: i32,
    overview_visible: bool,
    global_fullscreen: bool,
    unreadable: HashSet<WindowId>,
    fail_subscriptions: bool,
    fail_next_unsubscribe: bool,
    next_handle: u64,
    global_subs: HashMap<SubscriptionHandle, (TopologyEventKind, TopologySink)>,
    window_subs: HashMap<SubscriptionHandle, (WindowId, WindowProperty, TopologySink)>,
}

impl SimState {
    fn next_handle(&mut self) -> SubscriptionHandle {
        self.next_handle += 1;
        SubscriptionHandle(self.next_handle)
    }

    fn emit(&mut self, event: TopologyEvent) {
        match event {
            TopologyEvent::WindowPropertyChanged { window, property } => {
                self.window_subs
                    .retain(|_, (w, p, sink)| !(*w == window && *p == property) || sink.send(event).is_ok());
            }
            _ => {
                let kind = event.kind();
                self.global_subs
                    .retain(|_, (k, sink)| *k != kind || sink.send(event).is_ok());
            }
        }
    }

    fn window_mut(&mut self, id: WindowId) -> Option<&mut WindowView> {
        self.windows.get_mut(&id).map(|w| &mut w.view)
    }
}

/// In-memory host used for dry runs and tests.
///
/// Clones share the same desktop. Every mutator emits the raw events a real
/// compositor would emit for the same change.
#[derive(Clone, Default)]
pub struct SimulatedTopology {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a window on the active workspace without emitting anything, like a
    /// window that existed before the controller started
    pub fn insert_window(&self, view: WindowView) {
        let mut state = self.state.lock();
        let workspace = WorkspaceId(state.active_workspace);
        state.windows.insert(view.id, SimWindow { view, workspace });
    }

    /// Opens a window on the active workspace
    pub fn add_window(&self, view: WindowView) {
        let id = view.id;
        self.insert_window(view);
        let mut state = self.state.lock();
        state.emit(TopologyEvent::WindowCreated(id));
        state.emit(TopologyEvent::WindowMapped(id));
    }

    /// Closes a window; its per-window subscriptions go with it
    pub fn remove_window(&self, id: WindowId) {
        let mut state = self.state.lock();
        if state.windows.remove(&id).is_none() {
            return;
        }
        state.window_subs.retain(|_, (w, _, _)| *w != id);
        state.unreadable.remove(&id);
        state.emit(TopologyEvent::WindowDestroyed(id));
    }

    pub fn clear_windows(&self) {
        let ids: Vec<WindowId> = self.state.lock().windows.keys().copied().collect();
        for id in ids {
            self.remove_window(id);
        }
    }

    pub fn set_minimized(&self, id: WindowId, minimized: bool) {
        let mut state = self.state.lock();
        let Some(view) = state.window_mut(id) else { return };
        if view.minimized == minimized {
            return;
        }
        view.minimized = minimized;
        state.emit(if minimized {
            TopologyEvent::WindowMinimized(id)
        } else {
            TopologyEvent::WindowUnminimized(id)
        });
    }

    pub fn set_fullscreen(&self, id: WindowId, fullscreen: bool) {
        let mut state = self.state.lock();
        let Some(view) = state.window_mut(id) else { return };
        if view.fullscreen == fullscreen {
            return;
        }
        view.fullscreen = fullscreen;
        state.emit(TopologyEvent::WindowPropertyChanged {
            window: id,
            property: WindowProperty::Fullscreen,
        });
    }

    pub fn set_maximized(&self, id: WindowId, maximized: bool) {
        let mut state = self.state.lock();
        let Some(view) = state.window_mut(id) else { return };
        let changed_h = view.maximized_horizontal != maximized;
        let changed_v = view.maximized_vertical != maximized;
        view.maximized_horizontal = maximized;
        view.maximized_vertical = maximized;
        if changed_h {
            state.emit(TopologyEvent::WindowPropertyChanged {
                window: id,
                property: WindowProperty::MaximizedHorizontally,
            });
        }
        if changed_v {
            state.emit(TopologyEvent::WindowPropertyChanged {
                window: id,
                property: WindowProperty::MaximizedVertically,
            });
        }
    }

    pub fn move_to_monitor(&self, id: WindowId, monitor: i32) {
        let mut state = self.state.lock();
        let Some(view) = state.window_mut(id) else { return };
        let previous = view.monitor_index;
        if previous == monitor {
            return;
        }
        view.monitor_index = monitor;
        state.emit(TopologyEvent::WindowLeftMonitor {
            window: id,
            monitor: previous,
        });
    }

    pub fn set_overview_visible(&self, visible: bool) {
        let mut state = self.state.lock();
        if state.overview_visible == visible {
            return;
        }
        state.overview_visible = visible;
        state.emit(if visible {
            TopologyEvent::OverviewShowing
        } else {
            TopologyEvent::OverviewHidden
        });
    }

    pub fn set_global_fullscreen(&self, fullscreen: bool) {
        let mut state = self.state.lock();
        if state.global_fullscreen == fullscreen {
            return;
        }
        state.global_fullscreen = fullscreen;
        state.emit(TopologyEvent::FullscreenChanged);
    }

    pub fn switch_workspace(&self, workspace: WorkspaceId) {
        let mut state = self.state.lock();
        if state.active_workspace == workspace.0 {
            return;
        }
        state.active_workspace = workspace.0;
        state.emit(TopologyEvent::ActiveWorkspaceChanged);
    }

    #[cfg(test)]
    pub fn set_primary_monitor(&self, monitor: i32) {
        self.state.lock().primary_monitor = monitor;
    }

    /// Makes reads of `id` fail, as if it was destroyed between listing and reading
    #[cfg(test)]
    pub fn mark_unreadable(&self, id: WindowId) {
        self.state.lock().unreadable.insert(id);
    }

    #[cfg(test)]
    pub fn fail_subscriptions(&self, fail: bool) {
        self.state.lock().fail_subscriptions = fail;
    }

    /// The next unsubscribe is refused and its subscription stays live
    #[cfg(test)]
    pub fn fail_next_unsubscribe(&self) {
        self.state.lock().fail_next_unsubscribe = true;
    }

    /// (global, per-window) live subscription counts
    #[cfg(test)]
    pub fn subscription_counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.global_subs.len(), state.window_subs.len())
    }

    #[cfg(test)]
    pub fn window_subscription_count(&self, id: WindowId) -> usize {
        self.state
            .lock()
            .window_subs
            .values()
            .filter(|(w, _, _)| *w == id)
            .count()
    }
}

impl WindowTopologySource for SimulatedTopology {
    fn active_workspace(&self) -> WorkspaceId {
        WorkspaceId(self.state.lock().active_workspace)
    }

    fn list_windows(&self, workspace: WorkspaceId) -> Vec<WindowId> {
        self.state
            .lock()
            .windows
            .values()
            .filter(|w| w.workspace == workspace)
            .map(|w| w.view.id)
            .collect()
    }

    fn read_window(&self, window: WindowId) -> Result<WindowView> {
        let state = self.state.lock();
        if state.unreadable.contains(&window) {
            return PanelError::window_unreadable(window, "window is gone");
        }
        let Some(sim) = state.windows.get(&window) else {
            return PanelError::window_unreadable(window, "unknown window");
        };
        let mut view = sim.view.clone();
        view.on_active_workspace = sim.workspace.0 == state.active_workspace;
        Ok(view)
    }

    fn subscribe(
        &mut self,
        kind: TopologyEventKind,
        sink: TopologySink,
    ) -> Result<SubscriptionHandle> {
        let mut state = self.state.lock();
        if state.fail_subscriptions {
            return Err(panel_error!(subscription, "{:?} not available", kind));
        }
        let handle = state.next_handle();
        state.global_subs.insert(handle, (kind, sink));
        Ok(handle)
    }

    fn subscribe_window(
        &mut self,
        window: WindowId,
        property: WindowProperty,
        sink: TopologySink,
    ) -> Result<SubscriptionHandle> {
        let mut state = self.state.lock();
        if state.fail_subscriptions {
            return Err(panel_error!(subscription, "{:?} of {} not available", property, window));
        }
        if !state.windows.contains_key(&window) {
            return Err(panel_error!(subscription, "window {} does not exist", window));
        }
        let handle = state.next_handle();
        state.window_subs.insert(handle, (window, property, sink));
        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<()> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next_unsubscribe) {
            return Err(panel_error!(subscription, "host refused to drop {:?}", handle));
        }
        let removed = state.global_subs.remove(&handle).is_some()
            || state.window_subs.remove(&handle).is_some();
        if !removed {
            debug!("Unsubscribe of unknown handle {:?}", handle);
            return Err(panel_error!(subscription, "unknown handle {:?}", handle));
        }
        Ok(())
    }

    fn primary_monitor_index(&self) -> i32 {
        self.state.lock().primary_monitor
    }

    fn is_global_fullscreen_on_primary(&self) -> bool {
        self.state.lock().global_fullscreen
    }

    fn is_overview_visible(&self) -> bool {
        self.state.lock().overview_visible
    }
}
