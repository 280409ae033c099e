use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::events::SettingKey;

pub const ENV_PREFIX: &str = "DYNAMIC_PANEL_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub timing: TimingConfig,
    pub animation: AnimationConfig,
    pub classifier: ClassifierConfig,
    pub panel: PanelSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay before the first classification, lets the host layout settle
    pub warm_up_ms: u64,
    /// Quiet window after the last topology event before recomputation fires
    pub quiet_window_ms: u64,
    /// Delay between an animation-duration change and the retimed transition
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationMode {
    /// Interpolated ease-out transition, one frame per `frame_interval_ms`
    Eased,
    /// Every target is painted as soon as it is requested
    Immediate,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub mode: AnimationMode,
    pub frame_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Window class tags owned by the shell itself, never counted
    pub shell_classes: Vec<String>,
}

/// Live panel settings, the `[panel]` table of the config file.
///
/// Field names match the configuration store keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PanelSettings {
    pub transparent_opacity: i64,
    pub semi_opaque_opacity: i64,
    pub opaque_opacity: i64,
    pub maximized_opaque: bool,
    pub animation_duration: i64,
    pub debug_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            warm_up_ms: 500,
            quiet_window_ms: 200,
            settle_ms: 100,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            mode: AnimationMode::Eased,
            frame_interval_ms: 16,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            shell_classes: vec!["gjs".to_string(), "gnome-shell".to_string()],
        }
    }
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            transparent_opacity: 0,
            semi_opaque_opacity: 85,
            opaque_opacity: 100,
            maximized_opaque: false,
            animation_duration: 300,
            debug_logging: false,
        }
    }
}

impl TimingConfig {
    pub fn warm_up(&self) -> Duration {
        Duration::from_millis(self.warm_up_ms)
    }

    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.quiet_window_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl AnimationConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl PanelSettings {
    pub const OPACITY_RANGE: (i64, i64) = (0, 100);
    pub const DURATION_RANGE: (i64, i64) = (0, 1000);

    /// Default value for a single key
    pub fn default_int(key: SettingKey) -> i64 {
        let defaults = Self::default();
        match key {
            SettingKey::TransparentOpacity => defaults.transparent_opacity,
            SettingKey::SemiOpaqueOpacity => defaults.semi_opaque_opacity,
            SettingKey::OpaqueOpacity => defaults.opaque_opacity,
            SettingKey::AnimationDuration => defaults.animation_duration,
            SettingKey::MaximizedOpaque | SettingKey::DebugLogging => 0,
        }
    }

    pub fn default_bool(key: SettingKey) -> bool {
        let defaults = Self::default();
        match key {
            SettingKey::MaximizedOpaque => defaults.maximized_opaque,
            SettingKey::DebugLogging => defaults.debug_logging,
            _ => false,
        }
    }

    /// Brings every value into its documented range
    pub fn clamped(mut self) -> Self {
        let (lo, hi) = Self::OPACITY_RANGE;
        self.transparent_opacity = self.transparent_opacity.clamp(lo, hi);
        self.semi_opaque_opacity = self.semi_opaque_opacity.clamp(lo, hi);
        self.opaque_opacity = self.opaque_opacity.clamp(lo, hi);
        let (lo, hi) = Self::DURATION_RANGE;
        self.animation_duration = self.animation_duration.clamp(lo, hi);
        self
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration.max(0) as u64)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let config: Config = Self::figment(config_path)
            .extract()
            .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the TOML file, then `DYNAMIC_PANEL_*` environment variables
    pub fn figment(config_path: &Path) -> Figment {
        Self::layered(config_path, ENV_PREFIX)
    }

    fn layered(config_path: &Path, env_prefix: &str) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(
                Env::prefixed(env_prefix)
                    .split("__")
                    .map(|key| panel_env_key(key.as_str()).into()),
            )
    }

    /// Reads only the `[panel]` table, used by the hot-reloading settings store
    pub fn load_panel_settings(config_path: &Path) -> Result<PanelSettings> {
        Self::figment(config_path)
            .extract_inner::<PanelSettings>("panel")
            .with_context(|| format!("Failed to read [panel] from {:?}", config_path))
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        if self.animation.frame_interval_ms == 0 || self.animation.frame_interval_ms > 1000 {
            anyhow::bail!(
                "frame_interval_ms must be within 1..=1000, got {}",
                self.animation.frame_interval_ms
            );
        }

        let (lo, hi) = PanelSettings::OPACITY_RANGE;
        for (key, value) in [
            (SettingKey::TransparentOpacity, self.panel.transparent_opacity),
            (SettingKey::SemiOpaqueOpacity, self.panel.semi_opaque_opacity),
            (SettingKey::OpaqueOpacity, self.panel.opaque_opacity),
        ] {
            if !(lo..=hi).contains(&value) {
                anyhow::bail!("{} must be within {}..={}, got {}", key, lo, hi, value);
            }
        }

        let (lo, hi) = PanelSettings::DURATION_RANGE;
        if !(lo..=hi).contains(&self.panel.animation_duration) {
            anyhow::bail!(
                "{} must be within {}..={}, got {}",
                SettingKey::AnimationDuration,
                lo,
                hi,
                self.panel.animation_duration
            );
        }

        if self.classifier.shell_classes.iter().any(|c| c.is_empty()) {
            anyhow::bail!("Empty entry in classifier.shell_classes");
        }

        Ok(())
    }
}

/// `[panel]` keys are kebab-case, environment names can only carry underscores:
/// `PANEL__OPAQUE_OPACITY` has to land on `panel.opaque-opacity`
fn panel_env_key(key: &str) -> String {
    match key.split_once('.') {
        Some((section, field)) if section.eq_ignore_ascii_case("panel") => {
            format!("{}.{}", section, field.replace('_', "-"))
        }
        _ => key.to_string(),
    }
}
