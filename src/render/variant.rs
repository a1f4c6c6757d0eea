//! Rendering variants.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// One of the six QR rendering styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Standard,
    Micro,
    Compact,
    Custom,
    Holographic,
    Cube3d,
}

impl Variant {
    pub const ALL: [Variant; 6] = [
        Variant::Standard,
        Variant::Micro,
        Variant::Compact,
        Variant::Custom,
        Variant::Holographic,
        Variant::Cube3d,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Micro => "micro",
            Variant::Compact => "compact",
            Variant::Custom => "custom",
            Variant::Holographic => "holographic",
            Variant::Cube3d => "cube3d",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Variant::Standard => "High-contrast black on white, reliable for any scanner",
            Variant::Micro => "Smallest symbol with low error correction and thin quiet zone",
            Variant::Compact => "Auto-fitted symbol version with optimal data segmentation",
            Variant::Custom => "High error correction with selectable module shape and colours",
            Variant::Holographic => "Rounded modules filled with a two-colour gradient",
            Variant::Cube3d => "Symbol projected onto three faces of an isometric cube",
        }
    }

    /// Prefix inserted into artifact names; `None` for the plain variant.
    pub fn file_prefix(self) -> Option<&'static str> {
        match self {
            Variant::Standard => None,
            Variant::Micro => Some("micro"),
            Variant::Compact => Some("compact"),
            Variant::Custom => Some("custom"),
            Variant::Holographic => Some("holo"),
            Variant::Cube3d => Some("cube"),
        }
    }

    /// Deterministic artifact name for `slug`.
    pub fn file_name(self, slug: &str) -> String {
        match self.file_prefix() {
            Some(prefix) => format!("qr_{prefix}_{slug}.png"),
            None => format!("qr_{slug}.png"),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown style '{0}'")]
pub struct UnknownVariant(pub String);

impl FromStr for Variant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}
