use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a live window, unique while the window exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Workspace identity as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    Normal,
    Other,
}

/// Point-in-time read of a single window's attributes.
///
/// Only meaningful for the instant it was read: classification always works on
/// views taken for that classification, never on views kept from an earlier tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowView {
    pub id: WindowId,
    pub title: String,
    pub kind: WindowKind,
    pub hidden: bool,
    pub minimized: bool,
    pub fullscreen: bool,
    pub maximized_horizontal: bool,
    pub maximized_vertical: bool,
    pub monitor_index: i32,
    pub on_active_workspace: bool,
    pub class_tag: String,
}

impl WindowView {
    /// A visible, normal, non-maximized window on monitor 0 of the active workspace
    pub fn new(id: u64) -> Self {
        Self {
            id: WindowId(id),
            title: String::new(),
            kind: WindowKind::Normal,
            hidden: false,
            minimized: false,
            fullscreen: false,
            maximized_horizontal: false,
            maximized_vertical: false,
            monitor_index: 0,
            on_active_workspace: true,
            class_tag: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_class(mut self, class_tag: impl Into<String>) -> Self {
        self.class_tag = class_tag.into();
        self
    }

    pub fn with_kind(mut self, kind: WindowKind) -> Self {
        self.kind = kind;
        self
    }

    #[cfg(test)]
    pub fn with_monitor(mut self, monitor_index: i32) -> Self {
        self.monitor_index = monitor_index;
        self
    }

    #[cfg(test)]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    #[cfg(test)]
    pub fn minimized(mut self, minimized: bool) -> Self {
        self.minimized = minimized;
        self
    }

    #[cfg(test)]
    pub fn fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    #[cfg(test)]
    pub fn maximized(mut self, maximized: bool) -> Self {
        self.maximized_horizontal = maximized;
        self.maximized_vertical = maximized;
        self
    }

    #[cfg(test)]
    pub fn on_active_workspace(mut self, on_active_workspace: bool) -> Self {
        self.on_active_workspace = on_active_workspace;
        self
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized_horizontal && self.maximized_vertical
    }
}

impl fmt::Display for WindowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class_tag.is_empty() {
            write!(f, "{} \"{}\"", self.id, self.title)
        } else {
            write!(f, "{} \"{}\" ({})", self.id, self.title, self.class_tag)
        }
    }
}

/// Windows of the active workspace plus the global facts classification needs,
/// read together at classification time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologySnapshot {
    pub windows: Vec<WindowView>,
    pub primary_monitor: i32,
    pub global_fullscreen_on_primary: bool,
}

impl TopologySnapshot {
    #[cfg(test)]
    pub fn new(windows: Vec<WindowView>) -> Self {
        Self {
            windows,
            primary_monitor: 0,
            global_fullscreen_on_primary: false,
        }
    }

    #[cfg(test)]
    pub fn with_primary_monitor(mut self, primary_monitor: i32) -> Self {
        self.primary_monitor = primary_monitor;
        self
    }

    #[cfg(test)]
    pub fn with_global_fullscreen(mut self, global_fullscreen: bool) -> Self {
        self.global_fullscreen_on_primary = global_fullscreen;
        self
    }
}

/// Per-window properties whose change notifications are subscribed individually
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowProperty {
    Fullscreen,
    MaximizedHorizontally,
    MaximizedVertically,
}

impl WindowProperty {
    pub const ALL: [WindowProperty; 3] = [
        WindowProperty::Fullscreen,
        WindowProperty::MaximizedHorizontally,
        WindowProperty::MaximizedVertically,
    ];
}

/// Raw event emitted by the window topology source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyEvent {
    WindowCreated(WindowId),
    WindowLeftMonitor { window: WindowId, monitor: i32 },
    WindowMapped(WindowId),
    WindowDestroyed(WindowId),
    WindowMinimized(WindowId),
    WindowUnminimized(WindowId),
    OverviewShowing,
    OverviewHidden,
    FullscreenChanged,
    ActiveWorkspaceChanged,
    WindowPropertyChanged {
        window: WindowId,
        property: WindowProperty,
    },
}

impl TopologyEvent {
    pub fn kind(&self) -> TopologyEventKind {
        match self {
            TopologyEvent::WindowCreated(_) => TopologyEventKind::WindowCreated,
            TopologyEvent::WindowLeftMonitor { .. } => TopologyEventKind::WindowLeftMonitor,
            TopologyEvent::WindowMapped(_) => TopologyEventKind::WindowMapped,
            TopologyEvent::WindowDestroyed(_) => TopologyEventKind::WindowDestroyed,
            TopologyEvent::WindowMinimized(_) => TopologyEventKind::WindowMinimized,
            TopologyEvent::WindowUnminimized(_) => TopologyEventKind::WindowUnminimized,
            TopologyEvent::OverviewShowing => TopologyEventKind::OverviewShowing,
            TopologyEvent::OverviewHidden => TopologyEventKind::OverviewHidden,
            TopologyEvent::FullscreenChanged => TopologyEventKind::FullscreenChanged,
            TopologyEvent::ActiveWorkspaceChanged => TopologyEventKind::ActiveWorkspaceChanged,
            TopologyEvent::WindowPropertyChanged { .. } => TopologyEventKind::WindowPropertyChanged,
        }
    }

    /// Window the event is about, if any
    pub fn window(&self) -> Option<WindowId> {
        match *self {
            TopologyEvent::WindowCreated(id)
            | TopologyEvent::WindowMapped(id)
            | TopologyEvent::WindowDestroyed(id)
            | TopologyEvent::WindowMinimized(id)
            | TopologyEvent::WindowUnminimized(id) => Some(id),
            TopologyEvent::WindowLeftMonitor { window, .. }
            | TopologyEvent::WindowPropertyChanged { window, .. } => Some(window),
            _ => None,
        }
    }
}

impl fmt::Display for TopologyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyEvent::WindowLeftMonitor { window, monitor } => {
                write!(f, "window {} left monitor {}", window, monitor)
            }
            TopologyEvent::WindowPropertyChanged { window, property } => {
                write!(f, "window {} {:?} changed", window, property)
            }
            other => match other.window() {
                Some(window) => write!(f, "{:?} {}", other.kind(), window),
                None => write!(f, "{:?}", other.kind()),
            },
        }
    }
}

/// Global event categories a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopologyEventKind {
    WindowCreated,
    WindowLeftMonitor,
    WindowMapped,
    WindowDestroyed,
    WindowMinimized,
    WindowUnminimized,
    OverviewShowing,
    OverviewHidden,
    FullscreenChanged,
    ActiveWorkspaceChanged,
    WindowPropertyChanged,
}

impl TopologyEventKind {
    /// Categories subscribed globally; property changes are subscribed per window
    pub const GLOBAL: [TopologyEventKind; 10] = [
        TopologyEventKind::WindowCreated,
        TopologyEventKind::WindowLeftMonitor,
        TopologyEventKind::WindowMapped,
        TopologyEventKind::WindowDestroyed,
        TopologyEventKind::WindowMinimized,
        TopologyEventKind::WindowUnminimized,
        TopologyEventKind::OverviewShowing,
        TopologyEventKind::OverviewHidden,
        TopologyEventKind::FullscreenChanged,
        TopologyEventKind::ActiveWorkspaceChanged,
    ];
}
