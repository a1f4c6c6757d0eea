//! Isometric cube composition.
//!
//! One base symbol is projected onto the top, left and right faces of a cube
//! drawn on a transparent canvas. Each face is warped by sampling the source
//! through the inverse perspective transform, shaded, and alpha-composited.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::Serialize;

use crate::render::perspective::{is_degenerate, PerspectiveTransform, Point, Quad};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Top,
    Left,
    Right,
}

impl Face {
    pub const ALL: [Face; 3] = [Face::Top, Face::Left, Face::Right];

    /// Brightness multiplier applied to the face.
    pub fn shade(self) -> f32 {
        match self {
            Face::Top => 1.0,
            Face::Left => 0.82,
            Face::Right => 0.64,
        }
    }

    /// Destination corners on a `w × h` canvas, in the source order
    /// top-left, top-right, bottom-right, bottom-left.
    pub fn quad(self, w: f64, h: f64) -> Quad {
        let p = |fx: f64, fy: f64| Point::new(fx * w, fy * h);
        match self {
            Face::Top => [p(0.05, 0.26), p(0.5, 0.04), p(0.95, 0.26), p(0.5, 0.48)],
            Face::Left => [p(0.05, 0.26), p(0.5, 0.48), p(0.5, 0.96), p(0.05, 0.74)],
            Face::Right => [p(0.5, 0.48), p(0.95, 0.26), p(0.95, 0.74), p(0.5, 0.96)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Three destination corners are collinear.
    DegenerateQuad,
    /// No transform exists for the correspondence.
    SingularSystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceOutcome {
    Rendered,
    Skipped(SkipReason),
}

/// Per-face entry of the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaceReport {
    pub face: Face,
    pub rendered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

impl FaceReport {
    pub fn new(face: Face, outcome: FaceOutcome) -> Self {
        match outcome {
            FaceOutcome::Rendered => Self {
                face,
                rendered: true,
                skipped: None,
            },
            FaceOutcome::Skipped(reason) => Self {
                face,
                rendered: false,
                skipped: Some(reason),
            },
        }
    }
}

pub struct CubeImage {
    pub image: RgbaImage,
    pub faces: Vec<FaceReport>,
}

/// Canvas dimensions for a given face size.
pub fn canvas_size(face_size: u32) -> (u32, u32) {
    let f = face_size as f64;
    ((2.2 * f).round() as u32, (2.5 * f).round() as u32)
}

/// Build the cube from `symbol` with the standard face layout.
pub fn compose(symbol: &RgbaImage, face_size: u32) -> CubeImage {
    let (w, h) = canvas_size(face_size);
    let quads = Face::ALL.map(|face| (face, face.quad(w as f64, h as f64)));
    compose_with(symbol, face_size, (w, h), &quads)
}

/// Build the cube with explicit destination quads.
pub fn compose_with(
    symbol: &RgbaImage,
    face_size: u32,
    (w, h): (u32, u32),
    quads: &[(Face, Quad)],
) -> CubeImage {
    let face_img = imageops::resize(symbol, face_size, face_size, FilterType::Nearest);
    let mut canvas = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
    let mut faces = Vec::with_capacity(quads.len());

    for (face, dst) in quads {
        let outcome = match project_face(&face_img, dst, face.shade(), (w, h)) {
            Ok(layer) => {
                imageops::overlay(&mut canvas, &layer, 0, 0);
                FaceOutcome::Rendered
            }
            Err(reason) => {
                tracing::debug!(face = ?face, reason = ?reason, "Skipping cube face");
                FaceOutcome::Skipped(reason)
            }
        };
        faces.push(FaceReport::new(*face, outcome));
    }

    CubeImage {
        image: canvas,
        faces,
    }
}

fn project_face(
    src: &RgbaImage,
    dst: &Quad,
    shade: f32,
    (w, h): (u32, u32),
) -> Result<RgbaImage, SkipReason> {
    if is_degenerate(dst) {
        return Err(SkipReason::DegenerateQuad);
    }
    let (sw, sh) = (src.width() as f64, src.height() as f64);
    let src_quad = [
        Point::new(0.0, 0.0),
        Point::new(sw, 0.0),
        Point::new(sw, sh),
        Point::new(0.0, sh),
    ];
    let inverse =
        PerspectiveTransform::inverse_of(&src_quad, dst).ok_or(SkipReason::SingularSystem)?;

    let mut layer = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
    let (x0, y0, x1, y1) = bounds(dst, w, h);
    for y in y0..y1 {
        for x in x0..x1 {
            let centre = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let Some(s) = inverse.map(centre) else {
                continue;
            };
            if s.x < 0.0 || s.y < 0.0 || s.x >= sw || s.y >= sh {
                continue;
            }
            let px = bilinear(src, s.x - 0.5, s.y - 0.5);
            layer.put_pixel(x, y, shaded(px, shade));
        }
    }
    Ok(layer)
}

/// Integer bounding box of the quad, clipped to the canvas.
fn bounds(quad: &Quad, w: u32, h: u32) -> (u32, u32, u32, u32) {
    let min_x = quad.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = quad.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = quad.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = quad.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let clip = |v: f64, limit: u32| v.max(0.0).min(limit as f64) as u32;
    (
        clip(min_x.floor(), w),
        clip(min_y.floor(), h),
        clip(max_x.ceil(), w),
        clip(max_y.ceil(), h),
    )
}

fn bilinear(img: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let max_x = img.width() as i64 - 1;
    let max_y = img.height() as i64 - 1;
    let x0 = x.floor();
    let y0 = y.floor();
    let tx = x - x0;
    let ty = y - y0;
    let at = |xi: f64, yi: f64| {
        let cx = (xi as i64).clamp(0, max_x) as u32;
        let cy = (yi as i64).clamp(0, max_y) as u32;
        img.get_pixel(cx, cy).0
    };
    let p00 = at(x0, y0);
    let p10 = at(x0 + 1.0, y0);
    let p01 = at(x0, y0 + 1.0);
    let p11 = at(x0 + 1.0, y0 + 1.0);

    let mut out = [0u8; 4];
    for (i, channel) in out.iter_mut().enumerate() {
        let top = p00[i] as f64 * (1.0 - tx) + p10[i] as f64 * tx;
        let bottom = p01[i] as f64 * (1.0 - tx) + p11[i] as f64 * tx;
        *channel = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

fn shaded(px: Rgba<u8>, shade: f32) -> Rgba<u8> {
    let [r, g, b, a] = px.0;
    let s = |c: u8| (c as f32 * shade).round().clamp(0.0, 255.0) as u8;
    Rgba([s(r), s(g), s(b), a])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_symbol() -> RgbaImage {
        RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn canvas_dimensions() {
        assert_eq!(canvas_size(200), (440, 500));
        assert_eq!(canvas_size(50), (110, 125));
        assert_eq!(canvas_size(101), (222, 253));
    }

    #[test]
    fn all_faces_render_with_shading() {
        let cube = compose(&white_symbol(), 100);
        assert_eq!(cube.image.dimensions(), (220, 250));
        assert!(cube.faces.iter().all(|f| f.rendered));

        // Face interiors carry their shade; corners stay transparent.
        let top = cube.image.get_pixel(110, 35);
        let left = cube.image.get_pixel(60, 150);
        let right = cube.image.get_pixel(160, 150);
        assert_eq!(top.0, [255, 255, 255, 255]);
        assert_eq!(left.0, [209, 209, 209, 255]);
        assert_eq!(right.0, [163, 163, 163, 255]);
        assert_eq!(cube.image.get_pixel(0, 0).0[3], 0);
        assert_eq!(cube.image.get_pixel(219, 249).0[3], 0);
    }

    #[test]
    fn degenerate_face_is_skipped() {
        let (w, h) = canvas_size(100);
        let flat = [
            Point::new(10.0, 10.0),
            Point::new(20.0, 20.0),
            Point::new(30.0, 30.0),
            Point::new(10.0, 40.0),
        ];
        let quads = [
            (Face::Top, Face::Top.quad(w as f64, h as f64)),
            (Face::Left, flat),
        ];
        let cube = compose_with(&white_symbol(), 100, (w, h), &quads);
        assert_eq!(cube.faces.len(), 2);
        assert!(cube.faces[0].rendered);
        assert_eq!(
            cube.faces[1],
            FaceReport {
                face: Face::Left,
                rendered: false,
                skipped: Some(SkipReason::DegenerateQuad),
            }
        );
        // Nothing was drawn for the skipped face.
        assert_eq!(cube.image.get_pixel(20, 30).0[3], 0);
    }

    #[test]
    fn face_report_serializes_reason() {
        let report = FaceReport::new(Face::Right, FaceOutcome::Skipped(SkipReason::SingularSystem));
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["face"], "right");
        assert_eq!(json["rendered"], false);
        assert_eq!(json["skipped"], "singular_system");

        let json = serde_json::to_value(FaceReport::new(Face::Top, FaceOutcome::Rendered)).unwrap();
        assert!(json.get("skipped").is_none());
    }
}
