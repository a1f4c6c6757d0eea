//! Rasterizes a module grid into an RGBA image.

use image::{Rgba, RgbaImage};

use crate::render::matrix::ModuleGrid;
use crate::render::style::{Fill, ModuleDrawer, RenderStyle};

/// Fraction of the cell a gapped square or bar occupies across its width.
const SHRINK: f32 = 0.8;

/// Paint the symbol with its quiet zone.
pub fn rasterize(grid: &ModuleGrid, style: &RenderStyle) -> RgbaImage {
    let cell = style.box_size;
    let modules = grid.width() as u32 + 2 * style.border;
    let side = modules * cell;
    let mut img = RgbaImage::from_pixel(side, side, style.background);

    for my in 0..grid.width() {
        for mx in 0..grid.width() {
            if !grid.is_dark(mx, my) {
                continue;
            }
            let ox = (mx as u32 + style.border) * cell;
            let oy = (my as u32 + style.border) * cell;
            for v in 0..cell {
                for u in 0..cell {
                    if covers(style.drawer, grid, mx, my, u, v, cell) {
                        let px = ox + u;
                        img.put_pixel(px, oy + v, paint(style.fill, px, side));
                    }
                }
            }
        }
    }
    img
}

fn paint(fill: Fill, px: u32, side: u32) -> Rgba<u8> {
    match fill {
        Fill::Solid(color) => color,
        Fill::Gradient { start, end } => {
            let t = if side > 1 {
                px as f32 / (side - 1) as f32
            } else {
                0.0
            };
            let mut out = [0u8; 4];
            for (i, channel) in out.iter_mut().enumerate() {
                let a = start.0[i] as f32;
                let b = end.0[i] as f32;
                *channel = (a + (b - a) * t).round() as u8;
            }
            Rgba(out)
        }
    }
}

/// Whether pixel `(u, v)` of the dark module at `(mx, my)` is painted.
fn covers(
    drawer: ModuleDrawer,
    grid: &ModuleGrid,
    mx: usize,
    my: usize,
    u: u32,
    v: u32,
    cell: u32,
) -> bool {
    let half = cell as f32 / 2.0;
    let dx = u as f32 + 0.5 - half;
    let dy = v as f32 + 0.5 - half;
    let dark = |ox: isize, oy: isize| {
        let x = mx as isize + ox;
        let y = my as isize + oy;
        x >= 0 && y >= 0 && grid.is_dark(x as usize, y as usize)
    };

    match drawer {
        ModuleDrawer::Square => true,
        ModuleDrawer::GappedSquare => {
            let limit = half * SHRINK;
            dx.abs() <= limit && dy.abs() <= limit
        }
        ModuleDrawer::Circle => dx * dx + dy * dy <= half * half,
        ModuleDrawer::Rounded => {
            // A corner is rounded only when both neighbours touching it are light.
            let sx = if dx < 0.0 { -1 } else { 1 };
            let sy = if dy < 0.0 { -1 } else { 1 };
            if dark(sx, 0) || dark(0, sy) {
                return true;
            }
            in_rounded_corner(dx, dy, half)
        }
        ModuleDrawer::VerticalBars => {
            let limit = half * SHRINK;
            if dx.abs() > limit {
                return false;
            }
            let sy = if dy < 0.0 { -1 } else { 1 };
            dark(0, sy) || in_capsule_end(dx, dy, limit)
        }
        ModuleDrawer::HorizontalBars => {
            let limit = half * SHRINK;
            if dy.abs() > limit {
                return false;
            }
            let sx = if dx < 0.0 { -1 } else { 1 };
            dark(sx, 0) || in_capsule_end(dy, dx, limit)
        }
    }
}

fn in_rounded_corner(dx: f32, dy: f32, half: f32) -> bool {
    dx * dx + dy * dy <= half * half
}

/// Rounded cap of a bar: `across` is the narrow axis, `along` the long one.
fn in_capsule_end(across: f32, along: f32, radius: f32) -> bool {
    across * across + along * along <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::matrix::EncodeProfile;
    use qrcode::EcLevel;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn grid() -> ModuleGrid {
        ModuleGrid::encode(
            "hi",
            EncodeProfile::Fixed {
                version: 1,
                ec: EcLevel::M,
            },
        )
        .unwrap()
    }

    fn style(drawer: ModuleDrawer, fill: Fill) -> RenderStyle {
        RenderStyle {
            box_size: 10,
            border: 4,
            drawer,
            fill,
            background: WHITE,
            face_size: 200,
        }
    }

    #[test]
    fn image_size_includes_quiet_zone() {
        let img = rasterize(&grid(), &style(ModuleDrawer::Square, Fill::Solid(BLACK)));
        assert_eq!(img.dimensions(), (290, 290));
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        assert_eq!(*img.get_pixel(40, 40), BLACK);
    }

    #[test]
    fn circle_leaves_cell_corners_empty() {
        let img = rasterize(&grid(), &style(ModuleDrawer::Circle, Fill::Solid(BLACK)));
        // Top-left finder module: corner pixel light, centre dark.
        assert_eq!(*img.get_pixel(40, 40), WHITE);
        assert_eq!(*img.get_pixel(45, 45), BLACK);
    }

    #[test]
    fn gapped_square_leaves_margin() {
        let img = rasterize(
            &grid(),
            &style(ModuleDrawer::GappedSquare, Fill::Solid(BLACK)),
        );
        assert_eq!(*img.get_pixel(40, 45), WHITE);
        assert_eq!(*img.get_pixel(45, 45), BLACK);
    }

    #[test]
    fn rounded_keeps_joined_edges_square() {
        let img = rasterize(&grid(), &style(ModuleDrawer::Rounded, Fill::Solid(BLACK)));
        // Outer corner of the finder is rounded away.
        assert_eq!(*img.get_pixel(40, 40), WHITE);
        // Second finder module on the top row joins its neighbours.
        assert_eq!(*img.get_pixel(50, 40), BLACK);
    }

    #[test]
    fn gradient_runs_left_to_right() {
        let red = Rgba([255, 0, 0, 255]);
        let blue = Rgba([0, 0, 255, 255]);
        let img = rasterize(
            &grid(),
            &style(ModuleDrawer::Square, Fill::Gradient { start: red, end: blue }),
        );
        let left = img.get_pixel(40, 40);
        let right = img.get_pixel(249, 40);
        assert!(left.0[0] > left.0[2]);
        assert!(right.0[2] > right.0[0]);
    }
}
