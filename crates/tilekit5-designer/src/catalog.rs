//! The tile shape catalog.
//!
//! Construction routines for every shape the palette offers: regular
//! polygons and polygrams, golden-ratio shapes, assorted triangles, the
//! tangram set, polyomino and polyiamond families, the four Penrose
//! prototiles, measuring rulers and ellipses.
//!
//! Polygon builders return local-space [`PolygonGeometry`]; the tile
//! constructors at the bottom bundle geometry with a [`TileKind`] and a
//! default fill for shapes that keep their identity in documents.
//!
//! Most shapes are centered on the local origin so rotation and scaling
//! of a fresh tile pivot through its middle. Several shapes carry extra
//! collinear vertices on purpose (tangram triangle side midpoints, ruler
//! unit marks); those vertices are snap targets, not geometry noise.

use tilekit5_core::{Point, TileError};

use crate::color::Color;
use crate::polyform::{outline_from_segments, square_cell_scan, triangle_cell_scan};
use crate::shapes::{EllipseGeometry, PenroseShape, PolygonGeometry, TileGeometry, TileKind};
use crate::turtle::Turtle;

/// The golden ratio.
pub const PHI: f64 = 1.618_033_988_749_895;

/// A catalog entry ready to be placed in a scene.
#[derive(Debug, Clone)]
pub struct CatalogTile {
    pub kind: TileKind,
    pub geometry: TileGeometry,
    pub fill: Color,
}

impl CatalogTile {
    /// Converts the entry into a scene tile with the given id.
    pub fn into_tile(self, id: u64) -> crate::shapes::Tile {
        let mut tile = crate::shapes::Tile::new(id, self.kind, self.geometry);
        tile.fill = self.fill;
        tile
    }
}

fn positive(param: &str, value: f64) -> Result<f64, TileError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(TileError::InvalidParameter {
            param: param.into(),
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn regular_polygon_vertices(sides: usize, size: f64, rotate_degrees: f64) -> Vec<Point> {
    let theta = 2.0 * std::f64::consts::PI / sides as f64;
    let r = (size * size / (2.0 * (1.0 - theta.cos()))).sqrt();
    // Offset so the bottom edge lies flat and the polygon is centered
    // on the origin.
    let rotate = rotate_degrees.to_radians() + (std::f64::consts::PI + theta) / 2.0;
    (0..sides)
        .map(|i| {
            let a = i as f64 * theta + rotate;
            Point::new(r * a.cos(), r * a.sin())
        })
        .collect()
}

/// A regular polygon with `sides` edges of length `size`.
pub fn regular_polygon(sides: usize, size: f64) -> Result<PolygonGeometry, TileError> {
    regular_polygon_rotated(sides, size, 0.0)
}

/// A regular polygon rotated counterclockwise by `rotate_degrees`.
pub fn regular_polygon_rotated(
    sides: usize,
    size: f64,
    rotate_degrees: f64,
) -> Result<PolygonGeometry, TileError> {
    if sides < 3 {
        return Err(TileError::InvalidParameter {
            param: "sides".into(),
            reason: format!("a polygon needs at least 3 sides, got {sides}"),
        });
    }
    positive("size", size)?;
    PolygonGeometry::new(regular_polygon_vertices(sides, size, rotate_degrees))
}

/// A star polygram `{p/q}`: `p` points, visiting every `q`-th point.
///
/// Winds string-art style around the vertices of the regular `p`-gon
/// until the walk returns to its start. When `p` and `q` share a factor
/// the walk closes early and a simpler polygon results (a hexagram
/// degenerates to one of its triangles).
pub fn regular_polygram(p: usize, q: usize, size: f64) -> Result<PolygonGeometry, TileError> {
    if p < 3 || q == 0 || q >= p {
        return Err(TileError::InvalidParameter {
            param: "winding".into(),
            reason: format!("polygram requires 0 < q < p and p >= 3, got {{{p}/{q}}}"),
        });
    }
    positive("size", size)?;
    let nails = regular_polygon_vertices(p, size, 0.0);
    let mut vertices = Vec::new();
    let mut i = 0;
    loop {
        vertices.push(nails[i]);
        i = (i + q) % p;
        if i == 0 {
            break;
        }
    }
    PolygonGeometry::new(vertices)
}

/// A golden rectangle with short side `size` and long side `size * PHI`.
pub fn golden_rectangle(size: f64) -> Result<PolygonGeometry, TileError> {
    positive("size", size)?;
    let half = size / 2.0;
    PolygonGeometry::new(vec![
        Point::new(-half + size * PHI, half),
        Point::new(-half, half),
        Point::new(-half, -half),
        Point::new(-half + size * PHI, -half),
    ])
}

/// A rhombus with the given interior angle and edge length, centered on
/// the origin.
pub fn rhombus(angle_degrees: f64, size: f64) -> Result<PolygonGeometry, TileError> {
    positive("size", size)?;
    if angle_degrees <= 0.0 || angle_degrees >= 180.0 {
        return Err(TileError::InvalidParameter {
            param: "angle_degrees".into(),
            reason: format!("rhombus angle must lie in (0, 180), got {angle_degrees}"),
        });
    }
    let mut t = Turtle::new();
    t.pen_up()
        .bk(size / 2.0)
        .lt(angle_degrees)
        .bk(size / 2.0)
        .rt(angle_degrees)
        .pen_down();
    for _ in 0..2 {
        t.fd(size)
            .lt(angle_degrees)
            .fd(size)
            .lt(180.0 - angle_degrees);
    }
    PolygonGeometry::new(t.polygon())
}

/// A 30-60-90 triangle with short leg `size`, including an extra vertex
/// bisecting the hypotenuse.
pub fn triangle_30_60_90(size: f64) -> Result<PolygonGeometry, TileError> {
    positive("size", size)?;
    let mut t = Turtle::new();
    t.fd(size).lt(120.0).fd(size).fd(size);
    Ok(PolygonGeometry::new(t.polygon())?.recentered())
}

/// A 3-4-5 right triangle with unit snap vertices along every side.
pub fn triangle_3_4_5(size: f64) -> Result<PolygonGeometry, TileError> {
    positive("size", size)?;
    let mut t = Turtle::new();
    t.pen_up()
        .goto(Point::new(-2.0 * size, -1.5 * size))
        .pen_down();
    t.fd(size).fd(size).fd(size);
    t.lt(90.0);
    t.fd(size).fd(size).fd(size).fd(size);
    t.lt_radians(std::f64::consts::PI - (3.0f64 / 5.0).asin());
    t.fd(size).fd(size).fd(size).fd(size);
    PolygonGeometry::new(t.polygon())
}

/// A right isosceles triangle whose legs have length `size`.
pub fn right_isosceles_by_legs(size: f64) -> Result<PolygonGeometry, TileError> {
    positive("size", size)?;
    Ok(PolygonGeometry::new(vec![
        Point::new(0.0, size),
        Point::new(0.0, 0.0),
        Point::new(size, 0.0),
    ])?
    .recentered())
}

/// A right isosceles triangle whose base has length `size`.
pub fn right_isosceles_by_base(size: f64) -> Result<PolygonGeometry, TileError> {
    positive("size", size)?;
    Ok(PolygonGeometry::new(vec![
        Point::new(0.0, 0.0),
        Point::new(size / 2.0, size / 2.0),
        Point::new(size, 0.0),
    ])?
    .recentered())
}

/// The large tangram triangle, with vertices bisecting each side.
pub fn tangram_large_triangle(size: f64) -> Result<PolygonGeometry, TileError> {
    positive("size", size)?;
    let mut t = Turtle::new();
    t.fd(size)
        .fd(size)
        .lt(90.0)
        .fd(size)
        .fd(size)
        .lt(135.0)
        .fd(size * 2f64.sqrt());
    Ok(PolygonGeometry::new(t.polygon())?.recentered())
}

/// The medium tangram triangle, with a vertex bisecting the hypotenuse.
pub fn tangram_medium_triangle(size: f64) -> Result<PolygonGeometry, TileError> {
    positive("size", size)?;
    let mut t = Turtle::new();
    t.fd(size).fd(size).lt(135.0).fd(size * 2f64.sqrt());
    Ok(PolygonGeometry::new(t.polygon())?.recentered())
}

/// The 45-135 tangram parallelogram.
pub fn tangram_parallelogram(size: f64) -> Result<PolygonGeometry, TileError> {
    positive("size", size)?;
    Ok(PolygonGeometry::new(vec![
        Point::new(0.0, 0.0),
        Point::new(size, size),
        Point::new(size, 0.0),
        Point::new(0.0, -size),
    ])?
    .recentered())
}

/// The full seven-piece tangram set.
pub fn tangram_set(size: f64) -> Result<Vec<PolygonGeometry>, TileError> {
    Ok(vec![
        regular_polygon(4, size)?,
        right_isosceles_by_legs(size)?,
        right_isosceles_by_legs(size)?,
        tangram_parallelogram(size)?,
        tangram_medium_triangle(size)?,
        tangram_large_triangle(size)?,
        tangram_large_triangle(size)?,
    ])
}

/// A concave asymmetrical quadrilateral.
pub fn arrowhead(size: f64) -> Result<PolygonGeometry, TileError> {
    positive("size", size)?;
    let mut t = Turtle::new();
    t.lt(108.0)
        .fd(size)
        .lt(144.0)
        .fd(size)
        .lt(144.0)
        .fd(size / 2.0);
    Ok(PolygonGeometry::new(t.polygon())?.recentered())
}

// Polyform pattern tables. Each pattern is a bitmap of unit cells; see
// the polyform module for the grid conventions.

pub static TETRIAMOND_PATTERNS: [&[&[u8]]; 3] = [
    &[&[1, 1, 1, 1]],
    &[&[0, 1, 1, 1], &[1]],
    &[&[1, 1, 1], &[1]],
];

pub static PENTIAMOND_PATTERNS: [&[&[u8]]; 4] = [
    &[&[1, 1, 1, 1, 1]],
    &[&[1, 1, 1, 1], &[0, 0, 1]],
    &[&[1, 1, 1, 1], &[1]],
    &[&[0, 1, 1, 1], &[1, 0, 1]],
];

pub static HEXIAMOND_PATTERNS: [&[&[u8]]; 12] = [
    // bar
    &[&[1, 1, 1, 1, 1, 1]],
    // L
    &[&[0, 1, 1, 1, 1, 1], &[1]],
    // mexican hat
    &[&[0, 1, 1, 1, 1, 1], &[0, 0, 1]],
    // sphinx
    &[&[1, 1, 1, 1, 1], &[1]],
    // snake
    &[&[0, 1], &[1, 1, 1, 1], &[0, 0, 1]],
    // yacht
    &[&[1, 1, 1, 1], &[1, 0, 1]],
    // chevron
    &[&[1, 1, 1, 1], &[0, 0, 1, 1]],
    // signpost
    &[&[0, 0, 1, 1, 1, 1], &[0, 1, 1]],
    // lobster
    &[&[1, 1, 1, 1], &[1, 1]],
    // hook
    &[&[1, 1, 0, 1], &[1, 1, 1]],
    // hexagon
    &[&[0, 1, 1, 1], &[1, 1, 1]],
    // butterfly
    &[&[0, 0, 1, 1, 1], &[0, 1, 1, 1]],
];

pub static TRIOMINO_PATTERNS: [&[&[u8]]; 2] = [&[&[1, 1, 1]], &[&[1, 1], &[1, 0]]];

pub static TETROMINO_PATTERNS: [&[&[u8]]; 5] = [
    &[&[1, 1, 1, 1]],
    &[&[1, 1], &[1, 1]],
    &[&[1, 1, 1], &[0, 1, 0]],
    &[&[1, 1, 1], &[1, 0, 0]],
    &[&[1, 1, 0], &[0, 1, 1]],
];

pub static PENTOMINO_PATTERNS: [&[&[u8]]; 12] = [
    &[&[0, 0, 1], &[1, 1, 1], &[0, 1, 0]],
    &[&[1, 0, 1], &[1, 1, 1]],
    &[&[0, 0, 0, 1], &[1, 1, 1, 1]],
    &[&[1, 1, 1, 1, 1]],
    &[&[0, 1, 0, 0], &[1, 1, 1, 1]],
    &[&[1, 0, 0], &[1, 0, 0], &[1, 1, 1]],
    &[&[1, 1, 0], &[1, 1, 1]],
    &[&[1, 0, 0], &[1, 1, 0], &[0, 1, 1]],
    &[&[0, 0, 1, 1], &[1, 1, 1, 0]],
    &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 1]],
    &[&[1, 1, 1], &[0, 1, 0], &[0, 1, 0]],
    &[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0]],
];

/// A polyomino outline from a square-cell bitmap, centered on the origin.
pub fn polyomino(pattern: &[&[u8]]) -> Result<PolygonGeometry, TileError> {
    Ok(PolygonGeometry::new(outline_from_segments(square_cell_scan(pattern))?)?.recentered())
}

/// A polyiamond outline from a triangle-cell bitmap, centered on the
/// origin.
pub fn polyiamond(pattern: &[&[u8]]) -> Result<PolygonGeometry, TileError> {
    Ok(PolygonGeometry::new(outline_from_segments(triangle_cell_scan(pattern))?)?.recentered())
}

pub fn monomino() -> Result<PolygonGeometry, TileError> {
    polyomino(&[&[1]])
}

pub fn domino() -> Result<PolygonGeometry, TileError> {
    polyomino(&[&[1, 1]])
}

pub fn moniamond() -> Result<PolygonGeometry, TileError> {
    polyiamond(&[&[1]])
}

pub fn diamond() -> Result<PolygonGeometry, TileError> {
    polyiamond(&[&[1, 1]])
}

pub fn triamond() -> Result<PolygonGeometry, TileError> {
    polyiamond(&[&[1, 1, 1]])
}

pub fn triomino_set() -> Result<Vec<PolygonGeometry>, TileError> {
    TRIOMINO_PATTERNS.iter().map(|p| polyomino(p)).collect()
}

pub fn tetromino_set() -> Result<Vec<PolygonGeometry>, TileError> {
    TETROMINO_PATTERNS.iter().map(|p| polyomino(p)).collect()
}

pub fn pentomino_set() -> Result<Vec<PolygonGeometry>, TileError> {
    PENTOMINO_PATTERNS.iter().map(|p| polyomino(p)).collect()
}

pub fn tetriamond_set() -> Result<Vec<PolygonGeometry>, TileError> {
    TETRIAMOND_PATTERNS.iter().map(|p| polyiamond(p)).collect()
}

pub fn pentiamond_set() -> Result<Vec<PolygonGeometry>, TileError> {
    PENTIAMOND_PATTERNS.iter().map(|p| polyiamond(p)).collect()
}

pub fn hexiamond_set() -> Result<Vec<PolygonGeometry>, TileError> {
    HEXIAMOND_PATTERNS.iter().map(|p| polyiamond(p)).collect()
}

/// Outline of a Penrose prototile with edge size `size`.
///
/// Vertex order matters: the matching-rule markings are drawn around
/// vertices 0 and 2, so documents must round-trip vertices unshuffled.
/// Kites and darts are drawn with their longer edges of length `size`.
pub fn penrose_polygon(shape: PenroseShape, size: f64) -> Result<PolygonGeometry, TileError> {
    positive("size", size)?;
    match shape {
        PenroseShape::ThinRhomb => rhombus(144.0, size),
        PenroseShape::ThickRhomb => rhombus(72.0, size),
        PenroseShape::Dart => {
            // Start at the arrow tip and walk counterclockwise.
            let mut t = Turtle::new();
            t.pen_up().fd(0.5 * size).pen_down();
            t.lt(144.0)
                .fd(size)
                .lt(144.0)
                .fd(size / PHI)
                .rt(36.0)
                .fd(size / PHI);
            PolygonGeometry::new(t.polygon())
        }
        PenroseShape::Kite => {
            let mut t = Turtle::new();
            t.pen_up().fd(0.5 * size).pen_down();
            t.lt(108.0).fd(size / PHI).lt(108.0).fd(size).lt(108.0).fd(size);
            PolygonGeometry::new(t.polygon())
        }
    }
}

/// The default pastel fill for a Penrose prototile.
pub fn penrose_default_fill(shape: PenroseShape) -> Color {
    Color::from_hsv(shape.index() as i32 * 30, 31, 239)
}

/// A Penrose prototile catalog entry.
pub fn penrose_tile(shape: PenroseShape, size: f64) -> Result<CatalogTile, TileError> {
    Ok(CatalogTile {
        kind: TileKind::Penrose { shape, size },
        geometry: TileGeometry::Polygon(penrose_polygon(shape, size)?),
        fill: penrose_default_fill(shape),
    })
}

fn unit_fd(t: &mut Turtle, mut d: f64) {
    while d > 1.0 {
        t.fd(1.0);
        d -= 1.0;
    }
    if d > 0.0 {
        t.fd(d);
    }
}

/// Outline of a measuring ruler, with a snap vertex at every unit mark.
pub fn ruler_polygon(length: f64, width: f64) -> Result<PolygonGeometry, TileError> {
    positive("length", length)?;
    positive("width", width)?;
    let mut t = Turtle::new();
    for _ in 0..2 {
        unit_fd(&mut t, length);
        t.lt(90.0);
        unit_fd(&mut t, width);
        t.lt(90.0);
    }
    PolygonGeometry::new(t.polygon())
}

/// A measuring ruler catalog entry.
pub fn ruler_tile(length: f64, width: f64) -> Result<CatalogTile, TileError> {
    Ok(CatalogTile {
        kind: TileKind::Ruler { length },
        geometry: TileGeometry::Polygon(ruler_polygon(length, width)?),
        fill: Color::from_hsv(50, 127, 255),
    })
}

/// An ellipse catalog entry.
pub fn ellipse_tile(rx: f64, ry: f64, fill: Color) -> Result<CatalogTile, TileError> {
    Ok(CatalogTile {
        kind: TileKind::Ellipse,
        geometry: TileGeometry::Ellipse(EllipseGeometry::new(rx, ry)?),
        fill,
    })
}

/// A generic polygon catalog entry.
pub fn polygon_tile(geometry: PolygonGeometry, fill: Color) -> CatalogTile {
    CatalogTile {
        kind: TileKind::Polygon,
        geometry: TileGeometry::Polygon(geometry),
        fill,
    }
}
