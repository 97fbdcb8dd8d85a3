//! 2-D affine transforms.
//!
//! `AffineTransform` wraps a homogeneous 3x3 matrix (column-vector
//! convention) and exposes the operations the drag/snap pipeline composes:
//! translation, rotation about a point, scaling about a point, mirroring,
//! inversion and point mapping. Angles are degrees, positive
//! counterclockwise in scene space.

use crate::geometry::Point;
use nalgebra::{Matrix3, Vector3};

/// A composable, invertible 2-D affine transform.
///
/// The six coefficient accessors follow the SVG `matrix(a b c d e f)`
/// layout: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    m: Matrix3<f64>,
}

impl AffineTransform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    /// Builds a transform from SVG-style coefficients.
    pub fn from_coefficients(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            m: Matrix3::new(a, c, e, b, d, f, 0.0, 0.0, 1.0),
        }
    }

    /// A pure translation by `(dx, dy)`.
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::from_coefficients(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    /// A rotation about the origin by `angle_deg` degrees.
    pub fn rotation_degrees(angle_deg: f64) -> Self {
        let rad = angle_deg.to_radians();
        let (s, c) = rad.sin_cos();
        Self::from_coefficients(c, s, -s, c, 0.0, 0.0)
    }

    /// A rotation about an arbitrary center point.
    pub fn rotation_about(center: Point, angle_deg: f64) -> Self {
        Self::translation(-center.x, -center.y)
            .then(&Self::rotation_degrees(angle_deg))
            .then(&Self::translation(center.x, center.y))
    }

    /// A non-uniform scale about the origin.
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::from_coefficients(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A scale about an arbitrary center point.
    pub fn scale_about(center: Point, sx: f64, sy: f64) -> Self {
        Self::translation(-center.x, -center.y)
            .then(&Self::scale(sx, sy))
            .then(&Self::translation(center.x, center.y))
    }

    /// A mirror across the Y axis (x negated).
    pub fn mirror_x() -> Self {
        Self::scale(-1.0, 1.0)
    }

    /// Returns the transform that applies `self` first, then `next`.
    pub fn then(&self, next: &AffineTransform) -> Self {
        Self { m: next.m * self.m }
    }

    /// The inverse transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Self> {
        self.m.try_inverse().map(|m| Self { m })
    }

    /// Maps a point through the transform.
    pub fn map_point(&self, p: &Point) -> Point {
        let v = self.m * Vector3::new(p.x, p.y, 1.0);
        Point::new(v.x, v.y)
    }

    /// Maps a slice of points through the transform.
    pub fn map_points(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.map_point(p)).collect()
    }

    /// SVG-style coefficients `(a, b, c, d, e, f)`.
    pub fn coefficients(&self) -> (f64, f64, f64, f64, f64, f64) {
        (
            self.m[(0, 0)],
            self.m[(1, 0)],
            self.m[(0, 1)],
            self.m[(1, 1)],
            self.m[(0, 2)],
            self.m[(1, 2)],
        )
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        let (a, b, c, d, _, _) = self.coefficients();
        a * d - b * c
    }

    /// True when every coefficient is within `eps` of the identity.
    pub fn is_identity(&self, eps: f64) -> bool {
        self.approx_eq(&Self::identity(), eps)
    }

    /// Coefficient-wise comparison within `eps`.
    pub fn approx_eq(&self, other: &AffineTransform, eps: f64) -> bool {
        let (a1, b1, c1, d1, e1, f1) = self.coefficients();
        let (a2, b2, c2, d2, e2, f2) = other.coefficients();
        (a1 - a2).abs() <= eps
            && (b1 - b2).abs() <= eps
            && (c1 - c2).abs() <= eps
            && (d1 - d2).abs() <= eps
            && (e1 - e2).abs() <= eps
            && (f1 - f2).abs() <= eps
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_translation_maps_points() {
        let t = AffineTransform::translation(2.0, -3.0);
        let p = t.map_point(&Point::new(1.0, 1.0));
        assert!((p.x - 3.0).abs() < EPS);
        assert!((p.y + 2.0).abs() < EPS);
    }

    #[test]
    fn test_rotation_is_counterclockwise() {
        let r = AffineTransform::rotation_degrees(90.0);
        let p = r.map_point(&Point::new(1.0, 0.0));
        assert!((p.x - 0.0).abs() < EPS);
        assert!((p.y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_rotation_about_center_fixes_center() {
        let c = Point::new(5.0, 7.0);
        let r = AffineTransform::rotation_about(c, 33.0);
        let mapped = r.map_point(&c);
        assert!(mapped.distance_to(&c) < EPS);
    }

    #[test]
    fn test_then_applies_left_first() {
        let t = AffineTransform::translation(1.0, 0.0);
        let r = AffineTransform::rotation_degrees(90.0);
        // translate then rotate: (0,0) -> (1,0) -> (0,1)
        let p = t.then(&r).map_point(&Point::ORIGIN);
        assert!((p.x - 0.0).abs() < EPS);
        assert!((p.y - 1.0).abs() < EPS);
        // rotate then translate: (0,0) -> (0,0) -> (1,0)
        let q = r.then(&t).map_point(&Point::ORIGIN);
        assert!((q.x - 1.0).abs() < EPS);
        assert!((q.y - 0.0).abs() < EPS);
    }

    #[test]
    fn test_invert_roundtrip() {
        let t = AffineTransform::rotation_about(Point::new(1.0, 2.0), 47.0)
            .then(&AffineTransform::scale(2.0, 2.0))
            .then(&AffineTransform::translation(-4.0, 9.0));
        let inv = t.invert().unwrap();
        assert!(t.then(&inv).is_identity(1e-9));
    }

    #[test]
    fn test_singular_scale_has_no_inverse() {
        let t = AffineTransform::scale(0.0, 1.0);
        assert!(t.invert().is_none());
    }

    #[test]
    fn test_mirror_twice_is_identity() {
        let m = AffineTransform::mirror_x();
        assert!(m.then(&m).is_identity(EPS));
    }

    #[test]
    fn test_coefficients_roundtrip() {
        let t = AffineTransform::from_coefficients(1.5, 0.5, -0.5, 1.5, 10.0, -20.0);
        let (a, b, c, d, e, f) = t.coefficients();
        let u = AffineTransform::from_coefficients(a, b, c, d, e, f);
        assert!(t.approx_eq(&u, EPS));
    }
}
