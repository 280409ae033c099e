//! Event normalizer: many raw topology events in, one "recompute requested" out.
//!
//! Also owns every subscription the controller holds on the topology source,
//! including the per-window property subscriptions, tracked in a membership
//! table keyed by window id so a window is never attached twice.

use crate::debug_if_enabled;
use crate::events::{SubscriptionHandle, TopologyEvent, TopologyEventKind, WindowId, WindowKind, WindowProperty};
use crate::services::topology::{TopologySink, WindowTopologySource};
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::{info, warn};

type WindowHandles = SmallVec<[SubscriptionHandle; 3]>;

/// Why a recomputation was requested, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeRequested {
    pub cause: TopologyEventKind,
}

pub struct EventNormalizer {
    sink: TopologySink,
    global: Vec<SubscriptionHandle>,
    attached: HashMap<WindowId, WindowHandles>,
    debug: bool,
}

impl EventNormalizer {
    pub fn new(sink: TopologySink) -> Self {
        Self {
            sink,
            global: Vec::new(),
            attached: HashMap::new(),
            debug: false,
        }
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Subscribes to every global event category, then attaches the normal
    /// windows already present on the active workspace.
    ///
    /// Categories that cannot be subscribed are logged and skipped.
    pub fn attach_source(&mut self, source: &mut dyn WindowTopologySource) {
        for kind in TopologyEventKind::GLOBAL {
            match source.subscribe(kind, self.sink.clone()) {
                Ok(handle) => self.global.push(handle),
                Err(e) => warn!("No {:?} notifications: {}", kind, e),
            }
        }

        let workspace = source.active_workspace();
        for id in source.list_windows(workspace) {
            match source.read_window(id) {
                Ok(view) if view.kind == WindowKind::Normal => {
                    self.attach_window(source, id);
                }
                Ok(_) => {}
                Err(e) => debug_if_enabled!(self.debug, "Existing window {} skipped: {}", id, e),
            }
        }

        info!(
            "Event normalizer attached: {} global subscriptions, {} windows",
            self.global.len(),
            self.attached.len()
        );
    }

    /// Installs the property subscriptions of `window` unless already done.
    /// Returns whether the window was newly attached.
    pub fn attach_window(&mut self, source: &mut dyn WindowTopologySource, window: WindowId) -> bool {
        if self.is_attached(window) {
            return false;
        }

        let mut handles = WindowHandles::new();
        for property in WindowProperty::ALL {
            match source.subscribe_window(window, property, self.sink.clone()) {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!("No {:?} notifications for window {}: {}", property, window, e),
            }
        }

        debug_if_enabled!(
            self.debug,
            "Attached window {} ({} property subscriptions)",
            window,
            handles.len()
        );
        self.attached.insert(window, handles);
        true
    }

    pub fn is_attached(&self, window: WindowId) -> bool {
        self.attached.contains_key(&window)
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Maps any raw event to a recompute request, attaching windows seen through
    /// creation or mapping on the way.
    pub fn normalize(
        &mut self,
        event: TopologyEvent,
        source: &mut dyn WindowTopologySource,
    ) -> RecomputeRequested {
        match event {
            TopologyEvent::WindowCreated(id) | TopologyEvent::WindowMapped(id) => {
                self.attach_window(source, id);
            }
            TopologyEvent::WindowDestroyed(id) => {
                // the host already dropped the window's subscriptions
                self.attached.remove(&id);
            }
            _ => {}
        }

        debug_if_enabled!(self.debug, "Topology event: {}", event);
        RecomputeRequested {
            cause: event.kind(),
        }
    }

    /// Releases every subscription this normalizer created. Failures are logged;
    /// the bookkeeping is cleared regardless.
    pub fn teardown_all(&mut self, source: &mut dyn WindowTopologySource) {
        let window_handles = self.attached.drain().flat_map(|(_, handles)| handles);
        let handles: Vec<SubscriptionHandle> = self.global.drain(..).chain(window_handles).collect();

        let mut failed = 0;
        for handle in &handles {
            if let Err(e) = source.unsubscribe(*handle) {
                failed += 1;
                warn!("Failed to unsubscribe {:?}: {}", handle, e);
            }
        }

        info!(
            "Event normalizer detached: {} subscriptions released, {} failed",
            handles.len() - failed,
            failed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WindowView;
    use crate::services::topology::SimulatedTopology;
    use tokio::sync::mpsc;

    fn setup() -> (EventNormalizer, SimulatedTopology, mpsc::UnboundedReceiver<TopologyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventNormalizer::new(tx), SimulatedTopology::new(), rx)
    }

    #[test]
    fn test_attach_source_subscribes_and_attaches_existing_normal_windows() {
        let (mut normalizer, mut topology, _rx) = setup();
        topology.insert_window(WindowView::new(1));
        topology.insert_window(WindowView::new(2).with_kind(WindowKind::Other));

        normalizer.attach_source(&mut topology);

        assert!(normalizer.is_attached(WindowId(1)));
        assert!(!normalizer.is_attached(WindowId(2)));
        assert_eq!(topology.subscription_counts(), (TopologyEventKind::GLOBAL.len(), 3));
    }

    #[test]
    fn test_window_seen_through_several_paths_is_attached_once() {
        let (mut normalizer, mut topology, mut rx) = setup();
        normalizer.attach_source(&mut topology);

        topology.add_window(WindowView::new(5));
        while let Ok(event) = rx.try_recv() {
            normalizer.normalize(event, &mut topology);
        }
        assert!(!normalizer.attach_window(&mut topology, WindowId(5)));
        assert_eq!(topology.window_subscription_count(WindowId(5)), 3);
    }

    #[test]
    fn test_every_event_requests_recompute() {
        let (mut normalizer, mut topology, _rx) = setup();
        let events = [
            TopologyEvent::OverviewHidden,
            TopologyEvent::FullscreenChanged,
            TopologyEvent::WindowMinimized(WindowId(1)),
            TopologyEvent::WindowPropertyChanged {
                window: WindowId(1),
                property: WindowProperty::MaximizedVertically,
            },
        ];
        for event in events {
            let request = normalizer.normalize(event, &mut topology);
            assert_eq!(request.cause, event.kind());
        }
    }

    #[test]
    fn test_destroyed_window_is_forgotten() {
        let (mut normalizer, mut topology, mut rx) = setup();
        normalizer.attach_source(&mut topology);
        topology.add_window(WindowView::new(8));
        topology.remove_window(WindowId(8));
        while let Ok(event) = rx.try_recv() {
            normalizer.normalize(event, &mut topology);
        }
        assert!(!normalizer.is_attached(WindowId(8)));
        assert_eq!(topology.window_subscription_count(WindowId(8)), 0);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let (mut normalizer, mut topology, _rx) = setup();
        topology.insert_window(WindowView::new(1));
        topology.insert_window(WindowView::new(2));
        normalizer.attach_source(&mut topology);

        normalizer.teardown_all(&mut topology);
        assert_eq!(topology.subscription_counts(), (0, 0));
        assert_eq!(normalizer.attached_count(), 0);

        // second call has nothing left to release
        normalizer.teardown_all(&mut topology);
    }

    #[test]
    fn test_subscription_failures_are_tolerated() {
        let (mut normalizer, mut topology, _rx) = setup();
        topology.insert_window(WindowView::new(1));
        topology.fail_subscriptions(true);

        normalizer.attach_source(&mut topology);
        assert!(normalizer.is_attached(WindowId(1)));
        assert_eq!(topology.subscription_counts(), (0, 0));
    }

    #[test]
    fn test_teardown_continues_past_a_refused_unsubscribe() {
        let (mut normalizer, mut topology, _rx) = setup();
        topology.insert_window(WindowView::new(1));
        normalizer.attach_source(&mut topology);

        topology.fail_next_unsubscribe();
        normalizer.teardown_all(&mut topology);

        let (global, window) = topology.subscription_counts();
        assert_eq!(global + window, 1);
        assert_eq!(normalizer.attached_count(), 0);
    }
}
