//! Configuration store: live panel settings with per-key change notification.

mod file;
mod memory;
mod r#trait;

pub use self::file::FileSettingsStore;
#[cfg(test)]
pub(crate) use self::memory::MemorySettingsStore;
pub use self::r#trait::{read_settings, SettingsSink, SettingsStore};
