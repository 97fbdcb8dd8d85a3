//! Tile entities and their geometry.
//!
//! A [`Tile`] couples a local-space geometry with a scene transform, a
//! fill color and a selection flag. Geometry comes in two flavors:
//! polygon outlines (every catalog shape except the ellipse) and
//! ellipses. Snap behavior and transform access are factored into the
//! [`Snappable`] and [`Transformable`] traits so the snap search and
//! the drag controller do not care which concrete geometry they move.
//!
//! Local coordinates are the shape's own frame; the tile transform maps
//! local to scene. Catalog constructors center shapes on their local
//! origin so rotation and scaling about the origin behave sensibly for
//! freshly placed tiles.

use smallvec::SmallVec;
use tilekit5_core::{AffineTransform, Point, TileError};

use crate::color::Color;
use crate::spatial_index::Bounds;

/// Inline capacity for snap point lists.
///
/// Most catalog shapes have well under eight vertices; rulers and
/// polyforms spill to the heap.
pub type SnapPoints = SmallVec<[Point; 8]>;

/// Anything that exposes points for the magnetic snap search.
pub trait Snappable {
    /// Snap points in scene coordinates.
    fn snap_points(&self) -> SnapPoints;
}

/// Mutable access to an entity's scene transform.
pub trait Transformable {
    /// Current local-to-scene transform.
    fn transform(&self) -> &AffineTransform;

    /// Replaces the local-to-scene transform.
    fn set_transform(&mut self, transform: AffineTransform);

    /// Post-composes `next` onto the current transform.
    fn apply(&mut self, next: &AffineTransform) {
        let combined = self.transform().then(next);
        self.set_transform(combined);
    }
}

/// A closed polygon outline in local coordinates.
///
/// Vertices are stored open: a duplicated closing vertex is dropped on
/// construction so every stored vertex is a distinct snap point.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonGeometry {
    vertices: Vec<Point>,
}

impl PolygonGeometry {
    /// Creates a polygon from its outline vertices.
    pub fn new(mut vertices: Vec<Point>) -> Result<Self, TileError> {
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(TileError::InvalidParameter {
                param: "vertices".into(),
                reason: "a polygon needs at least three distinct vertices".into(),
            });
        }
        Ok(Self { vertices })
    }

    /// The outline vertices, without a closing duplicate.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Axis-aligned bounding box of the outline.
    pub fn bounding_box(&self) -> Bounds {
        Bounds::from_points(&self.vertices)
    }

    /// Translates the outline so its bounding box is centered on the
    /// local origin.
    pub fn recentered(mut self) -> Self {
        let c = self.bounding_box().center();
        for v in &mut self.vertices {
            *v = *v - c;
        }
        self
    }

    /// Even-odd containment test.
    ///
    /// Points exactly on an edge may land on either side; the hit test
    /// tolerance comes from snapping, not from this predicate.
    pub fn contains_point(&self, p: Point) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Unsigned area of the outline.
    pub fn area(&self) -> f64 {
        tilekit5_core::polygon_area(&self.vertices).abs()
    }
}

/// An axis-aligned ellipse centered on the local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseGeometry {
    rx: f64,
    ry: f64,
}

impl EllipseGeometry {
    /// Creates an ellipse with the given semi-axes.
    pub fn new(rx: f64, ry: f64) -> Result<Self, TileError> {
        if rx <= 0.0 || ry <= 0.0 {
            return Err(TileError::InvalidParameter {
                param: "radius".into(),
                reason: format!("semi-axes must be positive, got ({rx}, {ry})"),
            });
        }
        Ok(Self { rx, ry })
    }

    /// Semi-axis along local x.
    pub fn rx(&self) -> f64 {
        self.rx
    }

    /// Semi-axis along local y.
    pub fn ry(&self) -> f64 {
        self.ry
    }

    /// Bounding box of the ellipse.
    pub fn bounding_box(&self) -> Bounds {
        Bounds::new(-self.rx, -self.ry, self.rx, self.ry)
    }

    /// The four cardinal extremes plus the center.
    pub fn snap_points(&self) -> SnapPoints {
        SmallVec::from_slice(&[
            Point::new(self.rx, 0.0),
            Point::new(0.0, self.ry),
            Point::new(-self.rx, 0.0),
            Point::new(0.0, -self.ry),
            Point::ORIGIN,
        ])
    }

    /// Exact ellipse containment.
    pub fn contains_point(&self, p: Point) -> bool {
        let nx = p.x / self.rx;
        let ny = p.y / self.ry;
        nx * nx + ny * ny <= 1.0
    }
}

/// Local geometry of a tile.
#[derive(Debug, Clone, PartialEq)]
pub enum TileGeometry {
    Polygon(PolygonGeometry),
    Ellipse(EllipseGeometry),
}

impl TileGeometry {
    /// Snap points in local coordinates.
    pub fn snap_points(&self) -> SnapPoints {
        match self {
            TileGeometry::Polygon(p) => SmallVec::from_slice(p.vertices()),
            TileGeometry::Ellipse(e) => e.snap_points(),
        }
    }

    /// Bounding box in local coordinates.
    pub fn bounding_box(&self) -> Bounds {
        match self {
            TileGeometry::Polygon(p) => p.bounding_box(),
            TileGeometry::Ellipse(e) => e.bounding_box(),
        }
    }

    /// Containment test in local coordinates.
    pub fn contains_point(&self, p: Point) -> bool {
        match self {
            TileGeometry::Polygon(poly) => poly.contains_point(p),
            TileGeometry::Ellipse(e) => e.contains_point(p),
        }
    }
}

/// The four Penrose prototile shapes, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenroseShape {
    ThinRhomb,
    ThickRhomb,
    Dart,
    Kite,
}

impl PenroseShape {
    /// All shapes in catalog order.
    pub const ALL: [PenroseShape; 4] = [
        PenroseShape::ThinRhomb,
        PenroseShape::ThickRhomb,
        PenroseShape::Dart,
        PenroseShape::Kite,
    ];

    /// The shape's catalog index, as stored in documents.
    pub fn index(&self) -> u32 {
        match self {
            PenroseShape::ThinRhomb => 0,
            PenroseShape::ThickRhomb => 1,
            PenroseShape::Dart => 2,
            PenroseShape::Kite => 3,
        }
    }

    /// Looks up a shape by its catalog index.
    pub fn from_index(index: u32) -> Result<Self, TileError> {
        PenroseShape::ALL
            .get(index as usize)
            .copied()
            .ok_or(TileError::UnknownKind {
                kind: format!("penrose shape {index}"),
            })
    }
}

/// Identity of a tile for document round-tripping.
///
/// Most tiles are plain polygons whose outline is all a document needs;
/// Penrose tiles and rulers keep their construction parameters so they
/// reload as themselves rather than as anonymous polygons.
#[derive(Debug, Clone, PartialEq)]
pub enum TileKind {
    /// A generic polygon tile.
    Polygon,
    /// A Penrose prototile with its shape and edge size.
    Penrose { shape: PenroseShape, size: f64 },
    /// A measuring ruler with its length in scene units.
    Ruler { length: f64 },
    /// An ellipse tile.
    Ellipse,
}

/// A tile in the scene.
#[derive(Debug, Clone)]
pub struct Tile {
    /// Store-assigned identifier, unique within a scene.
    pub id: u64,
    /// Catalog identity, used when writing documents.
    pub kind: TileKind,
    /// Local-space geometry.
    pub geometry: TileGeometry,
    /// Local-to-scene transform.
    pub transform: AffineTransform,
    /// Fill color.
    pub fill: Color,
    /// Whether the tile is part of the current selection.
    pub selected: bool,
}

impl Tile {
    /// Creates an unselected tile with an identity transform and the
    /// default fill.
    pub fn new(id: u64, kind: TileKind, geometry: TileGeometry) -> Self {
        Self {
            id,
            kind,
            geometry,
            transform: AffineTransform::identity(),
            fill: Color::default(),
            selected: false,
        }
    }

    /// Scene-space bounding box.
    ///
    /// Maps the corners of the local box, so the result is conservative
    /// for rotated tiles. The snap search expands boxes by the snap
    /// margin anyway, so the slack is harmless.
    pub fn scene_bounding_box(&self) -> Bounds {
        let local = self.geometry.bounding_box();
        let corners = [
            Point::new(local.min_x, local.min_y),
            Point::new(local.max_x, local.min_y),
            Point::new(local.max_x, local.max_y),
            Point::new(local.min_x, local.max_y),
        ];
        Bounds::from_points(&self.transform.map_points(&corners))
    }

    /// Hit test against a scene point.
    ///
    /// A tile whose transform has collapsed to a singular matrix cannot
    /// be hit.
    pub fn contains_scene_point(&self, p: Point) -> bool {
        match self.transform.invert() {
            Some(inv) => self.geometry.contains_point(inv.map_point(&p)),
            None => false,
        }
    }
}

impl Snappable for Tile {
    fn snap_points(&self) -> SnapPoints {
        self.geometry
            .snap_points()
            .iter()
            .map(|p| self.transform.map_point(p))
            .collect()
    }
}

impl Transformable for Tile {
    fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    fn set_transform(&mut self, transform: AffineTransform) {
        self.transform = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> PolygonGeometry {
        PolygonGeometry::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_polygon_drops_closing_vertex() {
        let poly = PolygonGeometry::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(poly.vertices().len(), 3);
    }

    #[test]
    fn test_degenerate_polygon_rejected() {
        let result = PolygonGeometry::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(matches!(result, Err(TileError::InvalidParameter { .. })));
    }

    #[test]
    fn test_recentered_square() {
        let poly = unit_square().recentered();
        let bounds = poly.bounding_box();
        let c = bounds.center();
        assert!(c.x.abs() < 1e-12 && c.y.abs() < 1e-12);
        assert!((poly.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_polygon_containment() {
        let poly = unit_square();
        assert!(poly.contains_point(Point::new(0.5, 0.5)));
        assert!(!poly.contains_point(Point::new(1.5, 0.5)));
        assert!(!poly.contains_point(Point::new(-0.1, 0.5)));
    }

    #[test]
    fn test_ellipse_snap_points_and_containment() {
        let e = EllipseGeometry::new(2.0, 1.0).unwrap();
        let pts = e.snap_points();
        assert_eq!(pts.len(), 5);
        assert!(pts.contains(&Point::new(2.0, 0.0)));
        assert!(pts.contains(&Point::ORIGIN));
        assert!(e.contains_point(Point::new(1.9, 0.0)));
        assert!(!e.contains_point(Point::new(1.9, 0.9)));
    }

    #[test]
    fn test_ellipse_rejects_flat_axes() {
        assert!(EllipseGeometry::new(0.0, 1.0).is_err());
        assert!(EllipseGeometry::new(1.0, -2.0).is_err());
    }

    #[test]
    fn test_penrose_shape_index_roundtrip() {
        for shape in PenroseShape::ALL {
            assert_eq!(PenroseShape::from_index(shape.index()).unwrap(), shape);
        }
        assert!(matches!(
            PenroseShape::from_index(7),
            Err(TileError::UnknownKind { .. })
        ));
    }

    #[test]
    fn test_tile_scene_snap_points_follow_transform() {
        let mut tile = Tile::new(1, TileKind::Polygon, TileGeometry::Polygon(unit_square()));
        tile.apply(&AffineTransform::translation(10.0, 20.0));
        let pts = tile.snap_points();
        assert!(pts.contains(&Point::new(10.0, 20.0)));
        assert!(pts.contains(&Point::new(11.0, 21.0)));
    }

    #[test]
    fn test_tile_scene_bounding_box_rotated() {
        let mut tile = Tile::new(1, TileKind::Polygon, TileGeometry::Polygon(unit_square()));
        tile.apply(&AffineTransform::rotation_degrees(90.0));
        let b = tile.scene_bounding_box();
        assert!((b.min_x + 1.0).abs() < 1e-12);
        assert!((b.max_x - 0.0).abs() < 1e-12);
        assert!((b.min_y - 0.0).abs() < 1e-12);
        assert!((b.max_y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hit_test_through_transform() {
        let mut tile = Tile::new(1, TileKind::Polygon, TileGeometry::Polygon(unit_square()));
        tile.apply(&AffineTransform::translation(5.0, 0.0));
        assert!(tile.contains_scene_point(Point::new(5.5, 0.5)));
        assert!(!tile.contains_scene_point(Point::new(0.5, 0.5)));
    }

    #[test]
    fn test_singular_transform_never_hit() {
        let mut tile = Tile::new(1, TileKind::Polygon, TileGeometry::Polygon(unit_square()));
        tile.set_transform(AffineTransform::scale(0.0, 1.0));
        assert!(!tile.contains_scene_point(Point::ORIGIN));
    }
}
