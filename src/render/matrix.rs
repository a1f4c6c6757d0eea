//! Symbol encoding. `qrcode` is treated as a black box that turns a payload
//! into a square grid of dark and light modules.

use qrcode::bits::encode_auto;
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode, Version};

use crate::render::variant::Variant;

/// How a variant asks the encoder for its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeProfile {
    /// Start at a fixed version and grow when the payload does not fit.
    Fixed { version: i16, ec: EcLevel },
    /// Optimal segmentation and the smallest version that holds it.
    Auto { ec: EcLevel },
}

impl EncodeProfile {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Standard => EncodeProfile::Fixed {
                version: 1,
                ec: EcLevel::M,
            },
            Variant::Micro => EncodeProfile::Fixed {
                version: 1,
                ec: EcLevel::L,
            },
            Variant::Compact => EncodeProfile::Auto { ec: EcLevel::L },
            Variant::Custom | Variant::Holographic => EncodeProfile::Fixed {
                version: 3,
                ec: EcLevel::H,
            },
            Variant::Cube3d => EncodeProfile::Fixed {
                version: 2,
                ec: EcLevel::Q,
            },
        }
    }
}

/// Square grid of modules, row-major, `true` for dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    width: usize,
    modules: Vec<bool>,
}

impl ModuleGrid {
    /// Encode `payload` with the given profile.
    pub fn encode(payload: &str, profile: EncodeProfile) -> Result<Self, QrError> {
        let code = match profile {
            EncodeProfile::Fixed { version, ec } => {
                match QrCode::with_version(payload, Version::Normal(version), ec) {
                    Ok(code) => code,
                    Err(QrError::DataTooLong) => {
                        QrCode::with_error_correction_level(payload, ec)?
                    }
                    Err(e) => return Err(e),
                }
            }
            EncodeProfile::Auto { ec } => {
                let bits = encode_auto(payload.as_bytes(), ec)?;
                QrCode::with_bits(bits, ec)?
            }
        };
        Ok(Self::from_code(&code))
    }

    fn from_code(code: &QrCode) -> Self {
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        Self {
            width: code.width(),
            modules,
        }
    }

    /// Modules per side, excluding the quiet zone.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }
}
