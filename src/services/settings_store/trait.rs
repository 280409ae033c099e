use crate::config::PanelSettings;
use crate::error::{PanelError, Result};
use crate::events::{SettingKey, SubscriptionHandle};
use tokio::sync::mpsc;

/// Where a store delivers the key of every changed setting
pub type SettingsSink = mpsc::UnboundedSender<SettingKey>;

pub trait SettingsStore: Send {
    fn get_int(&self, key: SettingKey) -> Result<i64>;

    fn get_bool(&self, key: SettingKey) -> Result<bool>;

    fn subscribe_to_change(
        &mut self,
        key: SettingKey,
        sink: SettingsSink,
    ) -> Result<SubscriptionHandle>;

    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<()>;
}

/// Reads every key at once.
///
/// Keys that cannot be read fall back to their default and are returned with
/// the error; values are clamped to their documented ranges.
pub fn read_settings(store: &dyn SettingsStore) -> (PanelSettings, Vec<(SettingKey, PanelError)>) {
    let mut failures = Vec::new();

    let mut int = |key: SettingKey| match store.get_int(key) {
        Ok(value) => value,
        Err(e) => {
            failures.push((key, e));
            PanelSettings::default_int(key)
        }
    };
    let transparent_opacity = int(SettingKey::TransparentOpacity);
    let semi_opaque_opacity = int(SettingKey::SemiOpaqueOpacity);
    let opaque_opacity = int(SettingKey::OpaqueOpacity);
    let animation_duration = int(SettingKey::AnimationDuration);

    let mut boolean = |key: SettingKey| match store.get_bool(key) {
        Ok(value) => value,
        Err(e) => {
            failures.push((key, e));
            PanelSettings::default_bool(key)
        }
    };
    let maximized_opaque = boolean(SettingKey::MaximizedOpaque);
    let debug_logging = boolean(SettingKey::DebugLogging);

    let settings = PanelSettings {
        transparent_opacity,
        semi_opaque_opacity,
        opaque_opacity,
        maximized_opaque,
        animation_duration,
        debug_logging,
    }
    .clamped();

    (settings, failures)
}
