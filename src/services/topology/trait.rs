use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{
    SubscriptionHandle, TopologyEvent, TopologyEventKind, TopologySnapshot, WindowId,
    WindowProperty, WindowView, WorkspaceId,
};
use tokio::sync::mpsc;

/// Where a source delivers raw events for a subscription
pub type TopologySink = mpsc::UnboundedSender<TopologyEvent>;

/// Host windowing API as seen by the controller
pub trait WindowTopologySource: Send {
    fn active_workspace(&self) -> WorkspaceId;

    /// Windows present on `workspace`, in stacking order
    fn list_windows(&self, workspace: WorkspaceId) -> Vec<WindowId>;

    /// Reads a window's attributes. Fails if the window went away since it was listed.
    fn read_window(&self, window: WindowId) -> Result<WindowView>;

    fn subscribe(&mut self, kind: TopologyEventKind, sink: TopologySink)
        -> Result<SubscriptionHandle>;

    /// Property-change subscription for one window, dropped by the host when the window is destroyed
    fn subscribe_window(
        &mut self,
        window: WindowId,
        property: WindowProperty,
        sink: TopologySink,
    ) -> Result<SubscriptionHandle>;

    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<()>;

    fn primary_monitor_index(&self) -> i32;

    fn is_global_fullscreen_on_primary(&self) -> bool;

    fn is_overview_visible(&self) -> bool;
}

/// Reads a fresh snapshot of the active workspace.
///
/// Windows whose attributes cannot be read are left out instead of failing the snapshot.
pub fn take_snapshot(source: &dyn WindowTopologySource, debug: bool) -> TopologySnapshot {
    let workspace = source.active_workspace();
    let ids = source.list_windows(workspace);

    let mut windows = Vec::with_capacity(ids.len());
    for id in ids {
        match source.read_window(id) {
            Ok(view) => windows.push(view),
            Err(e) => debug_if_enabled!(debug, "Window {} skipped: {}", id, e),
        }
    }

    TopologySnapshot {
        windows,
        primary_monitor: source.primary_monitor_index(),
        global_fullscreen_on_primary: source.is_global_fullscreen_on_primary(),
    }
}
