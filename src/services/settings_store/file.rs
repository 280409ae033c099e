use crate::config::Config;
use crate::error::Result;
use crate::events::{SettingKey, SubscriptionHandle};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::memory::MemorySettingsStore;
use super::r#trait::{SettingsSink, SettingsStore};

/// Quiet period after the last file event before the file is re-read.
/// Editors emit several events per save, some of them on a truncated file.
const RELOAD_DEBOUNCE_MS: u64 = 200;

/// The `[panel]` table of the config file, re-read whenever the file changes
pub struct FileSettingsStore {
    path: PathBuf,
    values: MemorySettingsStore,
    watcher: Option<RecommendedWatcher>,
}

impl FileSettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = Config::load_panel_settings(&path)?.clamped();
        Ok(Self {
            path,
            values: MemorySettingsStore::new(settings),
            watcher: None,
        })
    }

    /// Re-reads the file. A file that no longer parses keeps the previous values.
    #[cfg(test)]
    pub fn reload(&self) -> Vec<SettingKey> {
        reload_into(&self.path, &self.values)
    }

    /// Starts hot-reloading; stops when the store is dropped.
    ///
    /// The parent directory is watched so editors that save by renaming a
    /// temporary file over the original are still noticed.
    pub fn watch(&mut self) -> Result<()> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher: RecommendedWatcher = notify::recommended_watcher(tx)?;

        let watch_path = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;

        let file_name: OsString = self.path.file_name().map(OsString::from).unwrap_or_default();
        let path = self.path.clone();
        let values = self.values.clone();

        std::thread::spawn(move || {
            coalesce_file_events(
                &rx,
                &file_name,
                Duration::from_millis(RELOAD_DEBOUNCE_MS),
                || {
                    reload_into(&path, &values);
                },
            );
        });

        info!("Watching {:?} for settings changes", self.path);
        self.watcher = Some(watcher);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Calls `on_change` once per burst of events touching `file_name`, after
/// `quiet` has passed without another one. Returns when the watcher is dropped.
fn coalesce_file_events(
    rx: &Receiver<notify::Result<Event>>,
    file_name: &OsStr,
    quiet: Duration,
    mut on_change: impl FnMut(),
) {
    let mut pending = false;
    loop {
        let received = if pending {
            rx.recv_timeout(quiet)
        } else {
            rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        };

        match received {
            Ok(Ok(event)) => {
                let affects_config = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().is_some_and(|name| name == file_name));
                if affects_config && !event.kind.is_access() {
                    pending = true;
                }
            }
            Ok(Err(e)) => warn!("Config watch error: {}", e),
            Err(RecvTimeoutError::Timeout) => {
                pending = false;
                on_change();
            }
            Err(RecvTimeoutError::Disconnected) => {
                if pending {
                    on_change();
                }
                break;
            }
        }
    }
}

fn reload_into(path: &Path, values: &MemorySettingsStore) -> Vec<SettingKey> {
    // a save caught halfway (truncated or renamed away) is not a config
    match fs::read_to_string(path) {
        Ok(contents) if !contents.trim().is_empty() => {}
        Ok(_) => {
            debug!("Config file {:?} is empty, keeping previous settings", path);
            return Vec::new();
        }
        Err(e) => {
            debug!("Config file {:?} unreadable ({}), keeping previous settings", path, e);
            return Vec::new();
        }
    }

    match Config::load_panel_settings(path) {
        Ok(settings) => {
            let changed = values.apply(&settings.clamped());
            if !changed.is_empty() {
                info!("Settings reloaded, changed: {:?}", changed);
            }
            changed
        }
        Err(e) => {
            warn!("Keeping previous settings, reload failed: {:#}", e);
            Vec::new()
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn get_int(&self, key: SettingKey) -> Result<i64> {
        self.values.get_int(key)
    }

    fn get_bool(&self, key: SettingKey) -> Result<bool> {
        self.values.get_bool(key)
    }

    fn subscribe_to_change(
        &mut self,
        key: SettingKey,
        sink: SettingsSink,
    ) -> Result<SubscriptionHandle> {
        self.values.subscribe_to_change(key, sink)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<()> {
        self.values.unsubscribe(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, EventKind, ModifyKind};
    use tokio::sync::mpsc;

    fn modified(path: &Path) -> notify::Result<Event> {
        Ok(Event::new(EventKind::Modify(ModifyKind::Any)).add_path(path.to_path_buf()))
    }

    #[test]
    fn test_open_reads_panel_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic-panel.toml");
        fs::write(&path, "[panel]\nopaque-opacity = 70\nmaximized-opaque = true\n").unwrap();

        let store = FileSettingsStore::open(&path).unwrap();
        assert_eq!(store.get_int(SettingKey::OpaqueOpacity).unwrap(), 70);
        assert!(store.get_bool(SettingKey::MaximizedOpaque).unwrap());
        assert_eq!(store.get_int(SettingKey::SemiOpaqueOpacity).unwrap(), 85);
    }

    #[test]
    fn test_reload_notifies_changed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic-panel.toml");
        fs::write(&path, "[panel]\nanimation-duration = 300\n").unwrap();

        let mut store = FileSettingsStore::open(&path).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        store.subscribe_to_change(SettingKey::AnimationDuration, tx).unwrap();

        fs::write(&path, "[panel]\nanimation-duration = 600\n").unwrap();
        assert_eq!(store.reload(), vec![SettingKey::AnimationDuration]);
        assert_eq!(rx.try_recv().unwrap(), SettingKey::AnimationDuration);
        assert_eq!(store.get_int(SettingKey::AnimationDuration).unwrap(), 600);
    }

    #[test]
    fn test_broken_file_keeps_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic-panel.toml");
        fs::write(&path, "[panel]\nopaque-opacity = 90\n").unwrap();
        let store = FileSettingsStore::open(&path).unwrap();

        fs::write(&path, "[panel\nopaque-opacity = ").unwrap();
        assert!(store.reload().is_empty());
        assert_eq!(store.get_int(SettingKey::OpaqueOpacity).unwrap(), 90);
    }

    #[test]
    fn test_reload_clamps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic-panel.toml");
        fs::write(&path, "[panel]\n").unwrap();
        let store = FileSettingsStore::open(&path).unwrap();

        fs::write(&path, "[panel]\ntransparent-opacity = 150\n").unwrap();
        store.reload();
        assert_eq!(store.get_int(SettingKey::TransparentOpacity).unwrap(), 100);
    }

    #[test]
    fn test_empty_or_missing_file_keeps_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic-panel.toml");
        fs::write(&path, "[panel]\nopaque-opacity = 40\nsemi-opaque-opacity = 20\n").unwrap();

        let mut store = FileSettingsStore::open(&path).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        store.subscribe_to_change(SettingKey::OpaqueOpacity, tx).unwrap();

        fs::write(&path, "").unwrap();
        assert!(store.reload().is_empty());
        fs::remove_file(&path).unwrap();
        assert!(store.reload().is_empty());

        assert_eq!(store.get_int(SettingKey::OpaqueOpacity).unwrap(), 40);
        assert_eq!(store.get_int(SettingKey::SemiOpaqueOpacity).unwrap(), 20);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_burst_triggers_one_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic-panel.toml");
        let (tx, rx) = std::sync::mpsc::channel();
        for _ in 0..4 {
            tx.send(modified(&path)).unwrap();
        }
        drop(tx);

        let mut reloads = 0;
        coalesce_file_events(&rx, OsStr::new("dynamic-panel.toml"), Duration::from_millis(50), || {
            reloads += 1
        });
        assert_eq!(reloads, 1);
    }

    #[test]
    fn test_separate_bursts_reload_separately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic-panel.toml");
        let (tx, rx) = std::sync::mpsc::channel();

        let sender = std::thread::spawn(move || {
            tx.send(modified(&path)).unwrap();
            tx.send(modified(&path)).unwrap();
            std::thread::sleep(Duration::from_millis(200));
            tx.send(modified(&path)).unwrap();
        });

        let mut reloads = 0;
        coalesce_file_events(&rx, OsStr::new("dynamic-panel.toml"), Duration::from_millis(50), || {
            reloads += 1
        });
        sender.join().unwrap();
        assert_eq!(reloads, 2);
    }

    #[test]
    fn test_other_files_and_reads_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(modified(&dir.path().join("other.toml"))).unwrap();
        tx.send(Ok(Event::new(EventKind::Access(AccessKind::Any))
            .add_path(dir.path().join("dynamic-panel.toml"))))
        .unwrap();
        drop(tx);

        let mut reloads = 0;
        coalesce_file_events(&rx, OsStr::new("dynamic-panel.toml"), Duration::from_millis(50), || {
            reloads += 1
        });
        assert_eq!(reloads, 0);
    }
}
