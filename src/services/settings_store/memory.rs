use crate::config::PanelSettings;
use crate::error::Result;
use crate::events::{SettingKey, SettingValue, SubscriptionHandle};
use crate::panel_error;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::r#trait::{SettingsSink, SettingsStore};

#[derive(Default)]
struct StoreState {
    values: HashMap<SettingKey, SettingValue>,
    subscribers: HashMap<SubscriptionHandle, (SettingKey, SettingsSink)>,
    fail_next_unsubscribe: bool,
    next_handle: u64,
}

impl StoreState {
    fn notify(&mut self, key: SettingKey) {
        self.subscribers
            .retain(|_, (k, sink)| *k != key || sink.send(key).is_ok());
    }
}

/// Key/value settings kept in memory. Clones share the same values.
#[derive(Clone, Default)]
pub struct MemorySettingsStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemorySettingsStore {
    pub fn new(settings: PanelSettings) -> Self {
        let store = Self::default();
        store.state.lock().values = values_of(&settings).into_iter().collect();
        store
    }

    /// Sets one key; subscribers hear about it only if the value changed.
    /// Returns whether it changed.
    pub fn set(&self, key: SettingKey, value: SettingValue) -> bool {
        if key.is_bool() != matches!(value, SettingValue::Bool(_)) {
            warn!("Ignoring {} for '{}': wrong type", value, key);
            return false;
        }
        let mut state = self.state.lock();
        if state.values.get(&key) == Some(&value) {
            return false;
        }
        state.values.insert(key, value);
        state.notify(key);
        true
    }

    /// Sets every key from `settings`, returns the keys that changed
    pub fn apply(&self, settings: &PanelSettings) -> Vec<SettingKey> {
        values_of(settings)
            .into_iter()
            .filter(|(key, value)| self.set(*key, *value))
            .map(|(key, _)| key)
            .collect()
    }

    /// Drops a key, reads of it fail afterwards
    #[cfg(test)]
    pub fn remove(&self, key: SettingKey) {
        self.state.lock().values.remove(&key);
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// The next unsubscribe is refused and its subscriber stays registered
    #[cfg(test)]
    pub fn fail_next_unsubscribe(&self) {
        self.state.lock().fail_next_unsubscribe = true;
    }

    fn get(&self, key: SettingKey) -> Result<SettingValue> {
        self.state
            .lock()
            .values
            .get(&key)
            .copied()
            .ok_or_else(|| panel_error!(configuration_unavailable, "'{}' is not set", key))
    }
}

fn values_of(settings: &PanelSettings) -> [(SettingKey, SettingValue); 6] {
    [
        (SettingKey::TransparentOpacity, SettingValue::Int(settings.transparent_opacity)),
        (SettingKey::SemiOpaqueOpacity, SettingValue::Int(settings.semi_opaque_opacity)),
        (SettingKey::OpaqueOpacity, SettingValue::Int(settings.opaque_opacity)),
        (SettingKey::MaximizedOpaque, SettingValue::Bool(settings.maximized_opaque)),
        (SettingKey::AnimationDuration, SettingValue::Int(settings.animation_duration)),
        (SettingKey::DebugLogging, SettingValue::Bool(settings.debug_logging)),
    ]
}

impl SettingsStore for MemorySettingsStore {
    fn get_int(&self, key: SettingKey) -> Result<i64> {
        match self.get(key)? {
            SettingValue::Int(value) => Ok(value),
            other => Err(panel_error!(
                configuration_unavailable,
                "'{}' holds {} where an integer was expected",
                key,
                other
            )),
        }
    }

    fn get_bool(&self, key: SettingKey) -> Result<bool> {
        match self.get(key)? {
            SettingValue::Bool(value) => Ok(value),
            other => Err(panel_error!(
                configuration_unavailable,
                "'{}' holds {} where a boolean was expected",
                key,
                other
            )),
        }
    }

    fn subscribe_to_change(
        &mut self,
        key: SettingKey,
        sink: SettingsSink,
    ) -> Result<SubscriptionHandle> {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = SubscriptionHandle(state.next_handle);
        state.subscribers.insert(handle, (key, sink));
        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<()> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next_unsubscribe) {
            return Err(panel_error!(subscription, "store refused to drop {:?}", handle));
        }
        match state.subscribers.remove(&handle) {
            Some(_) => Ok(()),
            None => Err(panel_error!(subscription, "unknown settings handle {:?}", handle)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_only_changed_keys_are_notified() {
        let mut store = MemorySettingsStore::new(PanelSettings::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        store.subscribe_to_change(SettingKey::OpaqueOpacity, tx.clone()).unwrap();
        store.subscribe_to_change(SettingKey::AnimationDuration, tx).unwrap();

        assert!(!store.set(SettingKey::OpaqueOpacity, SettingValue::Int(100)));
        assert!(store.set(SettingKey::OpaqueOpacity, SettingValue::Int(80)));
        assert!(store.set(SettingKey::SemiOpaqueOpacity, SettingValue::Int(70)));

        assert_eq!(rx.try_recv().unwrap(), SettingKey::OpaqueOpacity);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_apply_reports_changed_keys() {
        let store = MemorySettingsStore::new(PanelSettings::default());
        let changed = store.apply(&PanelSettings {
            animation_duration: 600,
            debug_logging: true,
            ..PanelSettings::default()
        });
        assert_eq!(changed, vec![SettingKey::AnimationDuration, SettingKey::DebugLogging]);
        assert_eq!(store.get_int(SettingKey::AnimationDuration).unwrap(), 600);
    }

    #[test]
    fn test_type_mismatch_is_unavailable() {
        let store = MemorySettingsStore::new(PanelSettings::default());
        assert!(store.get_int(SettingKey::DebugLogging).is_err());
        assert!(store.get_bool(SettingKey::OpaqueOpacity).is_err());
        assert!(!store.set(SettingKey::DebugLogging, SettingValue::Int(1)));
        assert!(!store.get_bool(SettingKey::DebugLogging).unwrap());
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = MemorySettingsStore::new(PanelSettings::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = store.subscribe_to_change(SettingKey::DebugLogging, tx).unwrap();
        assert_eq!(store.subscriber_count(), 1);
        store.unsubscribe(handle).unwrap();
        assert_eq!(store.subscriber_count(), 0);
        assert!(store.unsubscribe(handle).is_err());

        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = store.subscribe_to_change(SettingKey::DebugLogging, tx).unwrap();
        store.fail_next_unsubscribe();
        assert!(store.unsubscribe(handle).is_err());
        assert_eq!(store.subscriber_count(), 1);
        store.unsubscribe(handle).unwrap();
    }
}
