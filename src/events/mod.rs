pub mod settings;
pub mod window;

pub use settings::{SettingKey, SettingValue};
pub use window::{
    TopologyEvent, TopologyEventKind, TopologySnapshot, WindowId, WindowKind, WindowProperty,
    WindowView, WorkspaceId,
};

/// Handle returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(pub u64);
