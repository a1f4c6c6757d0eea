//! Request parameters and the clamped, validated style derived from them.

use std::ops::RangeInclusive;

use image::Rgba;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ApiError;
use crate::render::color::parse_color;
use crate::render::variant::Variant;

pub const BOX_SIZE_RANGE: RangeInclusive<i64> = 2..=20;
pub const BORDER_RANGE: RangeInclusive<i64> = 0..=10;
pub const FACE_SIZE_RANGE: RangeInclusive<i64> = 50..=500;
pub const MAX_SLUG_LEN: usize = 64;
pub const DEFAULT_SLUG: &str = "iot-dev";

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);
const CYAN: Rgba<u8> = Rgba([0, 255, 255, 255]);

/// JSON body of a render request. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderRequest {
    pub slug: Option<String>,
    /// Destination URL, kept for the audit log only.
    pub target: Option<String>,
    pub box_size: Option<i64>,
    pub border: Option<i64>,
    pub module_drawer: Option<String>,
    pub fill_color: Option<String>,
    pub back_color: Option<String>,
    pub gradient_start: Option<String>,
    pub gradient_end: Option<String>,
    pub face_size: Option<i64>,
}

/// Shape used to paint each dark module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleDrawer {
    #[default]
    Square,
    GappedSquare,
    Circle,
    Rounded,
    VerticalBars,
    HorizontalBars,
}

impl ModuleDrawer {
    /// Unknown names fall back to [`ModuleDrawer::Square`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "gapped_square" | "gapped" => ModuleDrawer::GappedSquare,
            "circle" => ModuleDrawer::Circle,
            "rounded" => ModuleDrawer::Rounded,
            "vertical_bars" => ModuleDrawer::VerticalBars,
            "horizontal_bars" => ModuleDrawer::HorizontalBars,
            _ => ModuleDrawer::Square,
        }
    }
}

/// Paint for dark modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Solid(Rgba<u8>),
    /// Left-to-right linear gradient across the symbol.
    Gradient { start: Rgba<u8>, end: Rgba<u8> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStyle {
    /// Pixels per module.
    pub box_size: u32,
    /// Quiet zone in modules.
    pub border: u32,
    pub drawer: ModuleDrawer,
    pub fill: Fill,
    pub background: Rgba<u8>,
    /// Edge length of each cube face in pixels.
    pub face_size: u32,
}

/// A fully validated render job.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub variant: Variant,
    pub slug: String,
    pub target: Option<String>,
    pub style: RenderStyle,
}

impl RenderJob {
    pub fn from_request(variant: Variant, request: &RenderRequest) -> Result<Self, ApiError> {
        let slug = request.slug.as_deref().unwrap_or(DEFAULT_SLUG).trim();
        validate_slug(slug)?;

        let target = match request.target.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => Some(validate_target(t)?),
            _ => None,
        };

        let fill_color = color_param("fill_color", request.fill_color.as_deref())?;
        let back_color = color_param("back_color", request.back_color.as_deref())?;
        let gradient_start = color_param("gradient_start", request.gradient_start.as_deref())?;
        let gradient_end = color_param("gradient_end", request.gradient_end.as_deref())?;

        let (default_box, default_border) = match variant {
            Variant::Micro => (4, 1),
            Variant::Compact => (6, 2),
            Variant::Cube3d => (10, 2),
            _ => (10, 4),
        };
        let box_size = clamp(request.box_size, default_box, BOX_SIZE_RANGE);
        let border = clamp(request.border, default_border, BORDER_RANGE);
        let face_size = clamp(request.face_size, 200, FACE_SIZE_RANGE);

        let requested_drawer = request
            .module_drawer
            .as_deref()
            .map(ModuleDrawer::from_name)
            .unwrap_or_default();

        let (drawer, fill, background) = match variant {
            Variant::Standard | Variant::Micro | Variant::Compact => {
                (ModuleDrawer::Square, Fill::Solid(BLACK), WHITE)
            }
            Variant::Custom => (
                requested_drawer,
                Fill::Solid(fill_color.unwrap_or(BLACK)),
                back_color.unwrap_or(WHITE),
            ),
            Variant::Holographic => (
                ModuleDrawer::Rounded,
                Fill::Gradient {
                    start: gradient_start.unwrap_or(MAGENTA),
                    end: gradient_end.unwrap_or(CYAN),
                },
                back_color.unwrap_or(WHITE),
            ),
            Variant::Cube3d => (
                ModuleDrawer::Square,
                Fill::Solid(fill_color.unwrap_or(BLACK)),
                back_color.unwrap_or(WHITE),
            ),
        };

        Ok(Self {
            variant,
            slug: slug.to_string(),
            target,
            style: RenderStyle {
                box_size,
                border,
                drawer,
                fill,
                background,
                face_size,
            },
        })
    }

    pub fn file_name(&self) -> String {
        self.variant.file_name(&self.slug)
    }
}

fn clamp(value: Option<i64>, default: u32, range: RangeInclusive<i64>) -> u32 {
    value
        .map(|v| v.clamp(*range.start(), *range.end()) as u32)
        .unwrap_or(default)
}

/// Slugs are 1 to 64 characters of `[A-Za-z0-9_-]`.
pub fn validate_slug(slug: &str) -> Result<(), ApiError> {
    let valid = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "slug must be 1-{MAX_SLUG_LEN} characters of letters, digits, '-' or '_'"
        )))
    }
}

fn validate_target(target: &str) -> Result<String, ApiError> {
    match Url::parse(target) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url.to_string()),
        _ => Err(ApiError::Validation(
            "target must be an absolute http(s) URL".to_string(),
        )),
    }
}

fn color_param(field: &str, value: Option<&str>) -> Result<Option<Rgba<u8>>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) => parse_color(raw).map(Some).ok_or_else(|| {
            ApiError::Validation(format!("{field}: '{raw}' is not a hex or named colour"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> RenderRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_request_uses_defaults() {
        let job = RenderJob::from_request(Variant::Standard, &RenderRequest::default()).unwrap();
        assert_eq!(job.slug, "iot-dev");
        assert_eq!(job.style.box_size, 10);
        assert_eq!(job.style.border, 4);
        assert_eq!(job.style.fill, Fill::Solid(BLACK));
        assert_eq!(job.file_name(), "qr_iot-dev.png");
    }

    #[test]
    fn numeric_parameters_are_clamped() {
        let req = request(r#"{"box_size": 500, "border": -3, "face_size": 10}"#);
        let job = RenderJob::from_request(Variant::Cube3d, &req).unwrap();
        assert_eq!(job.style.box_size, 20);
        assert_eq!(job.style.border, 0);
        assert_eq!(job.style.face_size, 50);

        let req = request(r#"{"box_size": 1, "border": 99, "face_size": 9000}"#);
        let job = RenderJob::from_request(Variant::Cube3d, &req).unwrap();
        assert_eq!(job.style.box_size, 2);
        assert_eq!(job.style.border, 10);
        assert_eq!(job.style.face_size, 500);
    }

    #[test]
    fn bad_slug_is_validation_error() {
        for slug in ["", "../etc", "hello world", "a/b", &"x".repeat(65)] {
            let req = RenderRequest {
                slug: Some(slug.to_string()),
                ..Default::default()
            };
            assert!(
                matches!(
                    RenderJob::from_request(Variant::Standard, &req),
                    Err(ApiError::Validation(_))
                ),
                "{slug:?}"
            );
        }
    }

    #[test]
    fn bad_color_is_validation_error() {
        let req = request(r#"{"fill_color": "not-a-colour"}"#);
        assert!(matches!(
            RenderJob::from_request(Variant::Custom, &req),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn bad_target_is_validation_error() {
        let req = request(r#"{"target": "javascript:alert(1)"}"#);
        assert!(matches!(
            RenderJob::from_request(Variant::Standard, &req),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn unknown_drawer_falls_back_to_square() {
        let req = request(r#"{"module_drawer": "hexagon"}"#);
        let job = RenderJob::from_request(Variant::Custom, &req).unwrap();
        assert_eq!(job.style.drawer, ModuleDrawer::Square);

        let req = request(r##"{"module_drawer": "circle", "fill_color": "#112233"}"##);
        let job = RenderJob::from_request(Variant::Custom, &req).unwrap();
        assert_eq!(job.style.drawer, ModuleDrawer::Circle);
        assert_eq!(job.style.fill, Fill::Solid(Rgba([0x11, 0x22, 0x33, 255])));
    }

    #[test]
    fn holographic_forces_rounded_gradient() {
        let req = request(r#"{"module_drawer": "circle", "gradient_end": "gold"}"#);
        let job = RenderJob::from_request(Variant::Holographic, &req).unwrap();
        assert_eq!(job.style.drawer, ModuleDrawer::Rounded);
        assert_eq!(
            job.style.fill,
            Fill::Gradient {
                start: MAGENTA,
                end: Rgba([255, 215, 0, 255])
            }
        );
        assert_eq!(job.file_name(), "qr_holo_iot-dev.png");
    }

    #[test]
    fn standard_ignores_style_overrides() {
        let req = request(r##"{"module_drawer": "circle", "fill_color": "#ff0000"}"##);
        let job = RenderJob::from_request(Variant::Standard, &req).unwrap();
        assert_eq!(job.style.drawer, ModuleDrawer::Square);
        assert_eq!(job.style.fill, Fill::Solid(BLACK));
    }
}
