//! Device emulation profiles
//!
//! A crawl can emulate a device either by naming one of the built-in presets
//! or by describing the viewport and user agent inline.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Viewport characteristics of an emulated device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_scale_factor")]
    pub device_scale_factor: f64,
    #[serde(default)]
    pub is_mobile: bool,
    #[serde(default)]
    pub has_touch: bool,
    #[serde(default)]
    pub is_landscape: bool,
}

fn default_scale_factor() -> f64 {
    1.0
}

/// A complete emulation profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceProfile {
    pub name: String,
    pub user_agent: String,
    pub viewport: Viewport,
}

/// Device setting as written in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceSetting {
    /// Name of a built-in preset (case-insensitive)
    Named(String),
    /// Inline profile
    Custom(DeviceProfile),
}

impl DeviceSetting {
    /// Resolves the setting to a concrete profile
    pub fn resolve(&self) -> ConfigResult<DeviceProfile> {
        match self {
            Self::Named(name) => {
                lookup_device(name).ok_or_else(|| ConfigError::UnknownDevice(name.clone()))
            }
            Self::Custom(profile) => Ok(profile.clone()),
        }
    }
}

struct Preset {
    name: &'static str,
    user_agent: &'static str,
    width: u32,
    height: u32,
    scale: f64,
    mobile: bool,
}

const PRESETS: &[Preset] = &[
    Preset {
        name: "iPhone X",
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 11_0 like Mac OS X) AppleWebKit/604.1.38 (KHTML, like Gecko) Version/11.0 Mobile/15A372 Safari/604.1",
        width: 375,
        height: 812,
        scale: 3.0,
        mobile: true,
    },
    Preset {
        name: "iPad",
        user_agent: "Mozilla/5.0 (iPad; CPU OS 11_0 like Mac OS X) AppleWebKit/604.1.34 (KHTML, like Gecko) Version/11.0 Mobile/15A5341f Safari/604.1",
        width: 768,
        height: 1024,
        scale: 2.0,
        mobile: true,
    },
    Preset {
        name: "Pixel 2",
        user_agent: "Mozilla/5.0 (Linux; Android 8.0; Pixel 2 Build/OPD3.170816.012) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/75.0.3765.0 Mobile Safari/537.36",
        width: 411,
        height: 731,
        scale: 2.625,
        mobile: true,
    },
    Preset {
        name: "Galaxy S5",
        user_agent: "Mozilla/5.0 (Linux; Android 5.0; SM-G900P Build/LRX21T) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/75.0.3765.0 Mobile Safari/537.36",
        width: 360,
        height: 640,
        scale: 3.0,
        mobile: true,
    },
    Preset {
        name: "Desktop 1080p",
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        width: 1920,
        height: 1080,
        scale: 1.0,
        mobile: false,
    },
];

/// Looks up a built-in device preset by name (case-insensitive)
pub fn lookup_device(name: &str) -> Option<DeviceProfile> {
    PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name.trim()))
        .map(|preset| DeviceProfile {
            name: preset.name.to_string(),
            user_agent: preset.user_agent.to_string(),
            viewport: Viewport {
                width: preset.width,
                height: preset.height,
                device_scale_factor: preset.scale,
                is_mobile: preset.mobile,
                has_touch: preset.mobile,
                is_landscape: false,
            },
        })
}

/// Names of all built-in presets
pub fn device_names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|preset| preset.name)
}
