use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keys recognized by the configuration store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingKey {
    TransparentOpacity,
    SemiOpaqueOpacity,
    OpaqueOpacity,
    MaximizedOpaque,
    AnimationDuration,
    DebugLogging,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::TransparentOpacity,
        SettingKey::SemiOpaqueOpacity,
        SettingKey::OpaqueOpacity,
        SettingKey::MaximizedOpaque,
        SettingKey::AnimationDuration,
        SettingKey::DebugLogging,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::TransparentOpacity => "transparent-opacity",
            SettingKey::SemiOpaqueOpacity => "semi-opaque-opacity",
            SettingKey::OpaqueOpacity => "opaque-opacity",
            SettingKey::MaximizedOpaque => "maximized-opaque",
            SettingKey::AnimationDuration => "animation-duration",
            SettingKey::DebugLogging => "debug-logging",
        }
    }

    /// Keys whose change alters the opacity the classifier produces
    pub fn affects_opacity(&self) -> bool {
        matches!(
            self,
            SettingKey::TransparentOpacity
                | SettingKey::SemiOpaqueOpacity
                | SettingKey::OpaqueOpacity
                | SettingKey::MaximizedOpaque
        )
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, SettingKey::MaximizedOpaque | SettingKey::DebugLogging)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown setting key '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Int(i64),
    Bool(bool),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Int(v) => write!(f, "{}", v),
            SettingValue::Bool(v) => write!(f, "{}", v),
        }
    }
}
