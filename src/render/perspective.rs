//! Planar perspective (homography) transforms.
//!
//! A transform maps `(x, y)` to
//! `((a·x + b·y + c) / (g·x + h·y + 1), (d·x + e·y + f) / (g·x + h·y + 1))`.
//! The eight coefficients are solved from four point correspondences.

/// Pivots smaller than this are treated as zero.
const PIVOT_EPSILON: f64 = 1e-10;

/// Twice-area threshold below which three points count as collinear.
const COLLINEAR_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Four corners in order top-left, top-right, bottom-right, bottom-left.
pub type Quad = [Point; 4];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveTransform {
    coeffs: [f64; 8],
}

impl PerspectiveTransform {
    /// Solve the transform taking each `src[i]` onto `dst[i]`.
    ///
    /// Returns `None` when the system is singular.
    pub fn solve(src: &Quad, dst: &Quad) -> Option<Self> {
        let mut m = [[0.0f64; 9]; 8];
        for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
            m[2 * i] = [s.x, s.y, 1.0, 0.0, 0.0, 0.0, -s.x * d.x, -s.y * d.x, d.x];
            m[2 * i + 1] = [0.0, 0.0, 0.0, s.x, s.y, 1.0, -s.x * d.y, -s.y * d.y, d.y];
        }
        gaussian_solve(m).map(|coeffs| Self { coeffs })
    }

    /// Transform taking `dst` back onto `src`.
    pub fn inverse_of(src: &Quad, dst: &Quad) -> Option<Self> {
        Self::solve(dst, src)
    }

    /// Map a point. `None` when it lands on the line at infinity.
    pub fn map(&self, p: Point) -> Option<Point> {
        let [a, b, c, d, e, f, g, h] = self.coeffs;
        let w = g * p.x + h * p.y + 1.0;
        if w.abs() < PIVOT_EPSILON {
            return None;
        }
        Some(Point::new(
            (a * p.x + b * p.y + c) / w,
            (d * p.x + e * p.y + f) / w,
        ))
    }

    pub fn coefficients(&self) -> [f64; 8] {
        self.coeffs
    }
}

/// True when any three of the four corners are collinear.
pub fn is_degenerate(quad: &Quad) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[i, j, k]| {
        let (p, q, r) = (quad[i], quad[j], quad[k]);
        let cross = (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x);
        cross.abs() < COLLINEAR_EPSILON
    })
}

/// Gaussian elimination with partial pivoting on an augmented 8×9 matrix.
fn gaussian_solve(mut m: [[f64; 9]; 8]) -> Option<[f64; 8]> {
    const N: usize = 8;
    for col in 0..N {
        let pivot = (col..N).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot][col].abs() < PIVOT_EPSILON {
            return None;
        }
        m.swap(col, pivot);

        for row in (col + 1)..N {
            let factor = m[row][col] / m[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..=N {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    let mut x = [0.0f64; N];
    for row in (0..N).rev() {
        let tail: f64 = ((row + 1)..N).map(|k| m[row][k] * x[k]).sum();
        x[row] = (m[row][N] - tail) / m[row][row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Quad {
        [
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn maps_corners_onto_destination() {
        let src = square(200.0);
        let dst = [
            Point::new(22.0, 130.0),
            Point::new(220.0, 20.0),
            Point::new(418.0, 130.0),
            Point::new(220.0, 240.0),
        ];
        let t = PerspectiveTransform::solve(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            assert_close(t.map(*s).unwrap(), *d);
        }
    }

    #[test]
    fn true_perspective_quad() {
        let src = square(100.0);
        let dst = [
            Point::new(10.0, 10.0),
            Point::new(90.0, 30.0),
            Point::new(80.0, 70.0),
            Point::new(20.0, 95.0),
        ];
        let t = PerspectiveTransform::solve(&src, &dst).unwrap();
        let inv = PerspectiveTransform::inverse_of(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            assert_close(t.map(*s).unwrap(), *d);
            assert_close(inv.map(*d).unwrap(), *s);
        }
        let mid = t.map(Point::new(50.0, 50.0)).unwrap();
        assert_close(inv.map(mid).unwrap(), Point::new(50.0, 50.0));
    }

    #[test]
    fn identity_has_unit_coefficients() {
        let t = PerspectiveTransform::solve(&square(10.0), &square(10.0)).unwrap();
        let c = t.coefficients();
        let expected = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
        for (got, want) in c.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn collapsed_destination_is_singular() {
        let dst = [Point::new(5.0, 5.0); 4];
        assert!(PerspectiveTransform::solve(&square(10.0), &dst).is_none());
    }

    #[test]
    fn collinear_corners_are_degenerate() {
        let flat = [
            Point::new(0.0, 0.0),
            Point::new(5.0, 5.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(is_degenerate(&flat));
        assert!(!is_degenerate(&square(10.0)));
    }
}
