//! SVG read/write for tile documents.
//!
//! A scene persists as plain SVG so any viewer can open it. Catalog
//! identity rides along in proprietary attributes under the `tiles`
//! namespace; readers that know the namespace restore Penrose tiles and
//! rulers as themselves, everyone else sees ordinary polygons.
//!
//! Reading is attribute scanning over the raw text, not an XML parse.
//! Elements the scanner does not recognize are skipped.

use std::fs;
use std::path::Path as FilePath;

use tilekit5_core::{AffineTransform, Point, Result, SvgError};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::color::Color;
use crate::scene::Viewport;
use crate::shapes::{PenroseShape, PolygonGeometry, Tile, TileGeometry, TileKind};
use crate::tile_store::TileStore;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>"#;
const SVG_NS: &str = "http://www.w3.org/2000/svg";
const TILES_NS: &str = "http://tiles/tiles";

const DEFAULT_RULER_LENGTH: f64 = 10.0;
const RULER_WIDTH: f64 = 1.0;

/// What a document read produced.
#[derive(Debug)]
pub struct SvgDocument {
    /// Tiles in document order, ids unassigned until stored.
    pub tiles: Vec<Tile>,
    /// View mapping recorded in the document's scene group, if any.
    pub view_transform: Option<AffineTransform>,
}

/// Serializes every tile and the view mapping to an SVG document string.
pub fn write_document(store: &TileStore, viewport: &Viewport) -> String {
    let (width, height) = match store.scene_bounds() {
        Some(b) => (b.max_x - b.min_x, b.max_y - b.min_y),
        None => (0.0, 0.0),
    };
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(&format!(
        "<svg xmlns=\"{SVG_NS}\" xmlns:tiles=\"{TILES_NS}\" version=\"1.1\" width=\"{width}\" height=\"{height}\">\n"
    ));
    let pan = viewport.pan();
    let z = viewport.zoom();
    out.push_str(&format!(
        "  <g transform=\"translate({} {}) matrix({z} 0 0 {z} 0 0)\" tiles:type=\"MagneticTileView\">\n",
        pan.x, pan.y
    ));
    for tile in store.iter() {
        out.push_str("    ");
        out.push_str(&tile_element(tile));
        out.push('\n');
    }
    out.push_str("  </g>\n</svg>\n");
    debug!(tiles = store.len(), bytes = out.len(), "document written");
    out
}

fn tile_element(tile: &Tile) -> String {
    let (a, b, c, d, e, f) = tile.transform.coefficients();
    let transform = format!("translate(0 0) matrix({a} {b} {c} {d} {e} {f})");
    match &tile.geometry {
        TileGeometry::Polygon(poly) => {
            let points = poly
                .vertices()
                .iter()
                .map(|p| format!("{},{}", p.x, p.y))
                .collect::<Vec<_>>()
                .join(" ");
            let mut el = format!(
                "<polygon points=\"{points}\" stroke=\"#000000\" stroke-width=\".03px\" fill=\"{}\" transform=\"{transform}\"",
                tile.fill.to_hex()
            );
            match &tile.kind {
                TileKind::Penrose { shape, size } => {
                    el.push_str(&format!(
                        " tiles:type=\"PenroseTileItem\" tiles:shapeno=\"{}\" tiles:size=\"{size}\"",
                        shape.index()
                    ));
                }
                TileKind::Ruler { length } => {
                    el.push_str(&format!(
                        " tiles:type=\"RulerTileItem\" tiles:size=\"{length}\""
                    ));
                }
                TileKind::Polygon | TileKind::Ellipse => {}
            }
            el.push_str(" />");
            el
        }
        TileGeometry::Ellipse(ell) => format!(
            "<ellipse cx=\"0\" cy=\"0\" rx=\"{}\" ry=\"{}\" stroke=\"#000000\" stroke-width=\".03px\" fill=\"{}\" transform=\"{transform}\" />",
            ell.rx(),
            ell.ry(),
            tile.fill.to_hex()
        ),
    }
}

/// Parses an SVG document string back into tiles.
///
/// Container structure is flattened; only the scene group's view mapping
/// survives from it. Unknown elements are skipped.
pub fn read_document(svg: &str) -> std::result::Result<SvgDocument, SvgError> {
    if !svg.contains("<svg") {
        return Err(SvgError::NotSvg);
    }
    let mut tiles = Vec::new();
    let mut view_transform = None;
    let mut pos = 0;
    while let Some(rel) = svg[pos..].find('<') {
        let start = pos + rel;
        let Some(end_rel) = svg[start..].find('>') else {
            break;
        };
        let end = start + end_rel;
        let tag = &svg[start + 1..end];
        pos = end + 1;
        if tag.starts_with('/') || tag.starts_with('?') || tag.starts_with('!') {
            continue;
        }
        match tag_name(tag) {
            "svg" | "g" => {
                if attr(tag, "tiles:type") == Some("MagneticTileView") {
                    if let Some(value) = attr(tag, "transform") {
                        view_transform = Some(parse_transform(value)?);
                    }
                }
            }
            name @ ("polygon" | "path") => tiles.push(read_polygon_element(tag, name)?),
            "ellipse" => tiles.push(read_ellipse_element(tag)?),
            other => {
                debug!(element = other, "skipping unrecognized element");
            }
        }
    }
    Ok(SvgDocument {
        tiles,
        view_transform,
    })
}

fn read_polygon_element(tag: &str, name: &str) -> std::result::Result<Tile, SvgError> {
    let entry = match attr(tag, "tiles:type") {
        Some("PenroseTileItem") => {
            let index = parse_number(tag, "tiles:shapeno")?.unwrap_or(0.0) as u32;
            let size = parse_number(tag, "tiles:size")?.unwrap_or(1.0);
            let shape = PenroseShape::from_index(index)
                .map_err(|_| malformed("tiles:shapeno", &index.to_string()))?;
            catalog::penrose_tile(shape, size)
                .map_err(|_| malformed("tiles:size", &size.to_string()))?
        }
        Some("RulerTileItem") => {
            let length = parse_number(tag, "tiles:size")?.unwrap_or(DEFAULT_RULER_LENGTH);
            catalog::ruler_tile(length, RULER_WIDTH)
                .map_err(|_| malformed("tiles:size", &length.to_string()))?
        }
        _ => {
            let vertices = if let Some(value) = attr(tag, "points") {
                parse_points(value)?
            } else if let Some(d) = attr(tag, "d") {
                path_first_polygon(d)?
            } else {
                return Err(SvgError::MissingGeometry {
                    element: name.into(),
                });
            };
            let geometry = PolygonGeometry::new(vertices).map_err(|_| SvgError::MissingGeometry {
                element: name.into(),
            })?;
            catalog::polygon_tile(geometry, Color::default())
        }
    };
    let mut tile = entry.into_tile(0);
    apply_paint_attrs(tag, &mut tile)?;
    Ok(tile)
}

fn read_ellipse_element(tag: &str) -> std::result::Result<Tile, SvgError> {
    let (cx, cy, rx, ry) = match (
        parse_number(tag, "cx")?,
        parse_number(tag, "cy")?,
        parse_number(tag, "rx")?,
        parse_number(tag, "ry")?,
    ) {
        (Some(cx), Some(cy), Some(rx), Some(ry)) => (cx, cy, rx, ry),
        _ => {
            return Err(SvgError::MissingGeometry {
                element: "ellipse".into(),
            })
        }
    };
    let entry = catalog::ellipse_tile(rx, ry, Color::default())
        .map_err(|_| malformed("rx", &rx.to_string()))?;
    let mut tile = entry.into_tile(0);
    apply_paint_attrs(tag, &mut tile)?;
    // The document centers the ellipse at (cx, cy); the geometry sits on
    // the local origin, so the offset folds into the tile transform.
    if cx != 0.0 || cy != 0.0 {
        tile.transform = AffineTransform::translation(cx, cy).then(&tile.transform);
    }
    Ok(tile)
}

fn apply_paint_attrs(tag: &str, tile: &mut Tile) -> std::result::Result<(), SvgError> {
    if let Some(value) = attr(tag, "fill") {
        match Color::from_hex(value) {
            Some(color) => tile.fill = color,
            None => warn!(fill = value, "unsupported fill, keeping default"),
        }
    }
    if let Some(value) = attr(tag, "transform") {
        tile.transform = parse_transform(value)?;
    }
    Ok(())
}

fn tag_name(tag: &str) -> &str {
    tag.split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
}

fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!("{name}=\"");
    let start = tag.find(&pattern)? + pattern.len();
    let end = tag[start..].find('"')?;
    Some(&tag[start..start + end])
}

fn malformed(attr: &str, value: &str) -> SvgError {
    SvgError::MalformedAttribute {
        attr: attr.into(),
        value: value.into(),
    }
}

fn parse_number(tag: &str, name: &str) -> std::result::Result<Option<f64>, SvgError> {
    match attr(tag, name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| malformed(name, value)),
        None => Ok(None),
    }
}

/// Splits a list of floats on whitespace and commas.
fn float_list(text: &str) -> Option<Vec<f64>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| t.parse().ok())
        .collect()
}

fn parse_points(value: &str) -> std::result::Result<Vec<Point>, SvgError> {
    let nums = float_list(value).ok_or_else(|| malformed("points", value))?;
    if nums.len() < 2 || nums.len() % 2 != 0 {
        return Err(malformed("points", value));
    }
    Ok(nums.chunks(2).map(|c| Point::new(c[0], c[1])).collect())
}

/// Parses a transform attribute's clause list into one transform.
///
/// Clauses are written outermost first, so a point passes through them
/// right to left.
fn parse_transform(value: &str) -> std::result::Result<AffineTransform, SvgError> {
    let mut combined = AffineTransform::identity();
    let mut rest = value.trim();
    while !rest.is_empty() {
        let open = rest.find('(').ok_or_else(|| malformed("transform", value))?;
        let close = rest.find(')').ok_or_else(|| malformed("transform", value))?;
        if close < open {
            return Err(malformed("transform", value));
        }
        let name = rest[..open].trim();
        let args =
            float_list(&rest[open + 1..close]).ok_or_else(|| malformed("transform", value))?;
        let clause = match (name, args.len()) {
            ("translate", 1) => AffineTransform::translation(args[0], 0.0),
            ("translate", 2) => AffineTransform::translation(args[0], args[1]),
            ("scale", 1) => AffineTransform::scale(args[0], args[0]),
            ("scale", 2) => AffineTransform::scale(args[0], args[1]),
            ("rotate", 1) => AffineTransform::rotation_degrees(args[0]),
            ("matrix", 6) => {
                AffineTransform::from_coefficients(args[0], args[1], args[2], args[3], args[4], args[5])
            }
            _ => return Err(malformed("transform", value)),
        };
        combined = clause.then(&combined);
        rest = rest[close + 1..].trim_start();
    }
    Ok(combined)
}

/// Extracts the first closed subpath of a path's `d` data as a polygon.
///
/// Only move and line commands contribute; curves and axis lines are
/// skipped. Lowercase commands are relative to the previous point.
fn path_first_polygon(d: &str) -> std::result::Result<Vec<Point>, SvgError> {
    let tokens = path_tokens(d);
    let mut points: Vec<Point> = Vec::new();
    let mut cmd = 'M';
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token.len() == 1 && token.chars().all(|c| c.is_ascii_alphabetic()) {
            cmd = token.chars().next().unwrap_or('M');
            i += 1;
            if cmd == 'Z' || cmd == 'z' {
                break;
            }
            if (cmd == 'M' || cmd == 'm') && !points.is_empty() {
                // A second subpath starts; only the first is kept.
                break;
            }
            continue;
        }
        match cmd {
            'M' | 'L' | 'm' | 'l' => {
                if i + 1 >= tokens.len() {
                    return Err(malformed("d", d));
                }
                let x: f64 = tokens[i].parse().map_err(|_| malformed("d", d))?;
                let y: f64 = tokens[i + 1].parse().map_err(|_| malformed("d", d))?;
                let base = if cmd.is_ascii_lowercase() {
                    points.last().copied().unwrap_or(Point::ORIGIN)
                } else {
                    Point::ORIGIN
                };
                points.push(Point::new(base.x + x, base.y + y));
                i += 2;
                // Pairs after a move are implicit line commands.
                cmd = if cmd == 'M' { 'L' } else if cmd == 'm' { 'l' } else { cmd };
            }
            _ => {
                i += 1;
            }
        }
    }
    if points.len() < 3 {
        return Err(SvgError::MissingGeometry {
            element: "path".into(),
        });
    }
    Ok(points)
}

fn path_tokens(d: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in d.chars() {
        if ch.is_ascii_alphabetic() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(ch.to_string());
        } else if ch.is_whitespace() || ch == ',' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            if ch == '-' && !current.is_empty() && !current.ends_with('e') {
                tokens.push(std::mem::take(&mut current));
            }
            current.push(ch);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Writes the document for `store` to a file.
pub fn save_document(path: &FilePath, store: &TileStore, viewport: &Viewport) -> Result<()> {
    let contents = write_document(store, viewport);
    fs::write(path, contents)?;
    info!(path = %path.display(), tiles = store.len(), "document saved");
    Ok(())
}

/// Reads a document from a file.
pub fn load_document(path: &FilePath) -> Result<SvgDocument> {
    let text = fs::read_to_string(path)?;
    let doc = read_document(&text)?;
    info!(path = %path.display(), tiles = doc.tiles.len(), "document loaded");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_tile() -> Tile {
        catalog::polygon_tile(
            catalog::regular_polygon(4, 1.0).unwrap(),
            Color::new(0x12, 0x34, 0x56),
        )
        .into_tile(0)
    }

    fn roundtrip(store: &TileStore) -> SvgDocument {
        let text = write_document(store, &Viewport::default());
        read_document(&text).unwrap()
    }

    #[test]
    fn test_polygon_roundtrip_preserves_geometry_transform_color() {
        let mut store = TileStore::new();
        let id = store.add_tile(square_tile());
        store.set_transform(
            id,
            AffineTransform::rotation_degrees(30.0).then(&AffineTransform::translation(2.0, 3.0)),
        );
        let doc = roundtrip(&store);
        assert_eq!(doc.tiles.len(), 1);
        let back = &doc.tiles[0];
        assert_eq!(back.kind, TileKind::Polygon);
        assert_eq!(back.fill, Color::new(0x12, 0x34, 0x56));
        let (orig, read) = (store.get(id).unwrap(), back);
        let a = orig.transform.coefficients();
        let b = read.transform.coefficients();
        assert!((a.0 - b.0).abs() < 1e-12 && (a.4 - b.4).abs() < 1e-12);
        match (&orig.geometry, &read.geometry) {
            (TileGeometry::Polygon(p), TileGeometry::Polygon(q)) => {
                assert_eq!(p.vertices().len(), q.vertices().len());
                for (u, v) in p.vertices().iter().zip(q.vertices()) {
                    assert!(u.distance_to(v) < 1e-12);
                }
            }
            _ => panic!("expected polygons"),
        }
    }

    #[test]
    fn test_penrose_identity_survives_roundtrip() {
        let mut store = TileStore::new();
        store.add(catalog::penrose_tile(PenroseShape::Kite, 2.0).unwrap());
        let doc = roundtrip(&store);
        match doc.tiles[0].kind {
            TileKind::Penrose { shape, size } => {
                assert_eq!(shape, PenroseShape::Kite);
                assert!((size - 2.0).abs() < 1e-12);
            }
            ref other => panic!("expected a Penrose tile, got {other:?}"),
        }
    }

    #[test]
    fn test_ruler_identity_survives_roundtrip() {
        let mut store = TileStore::new();
        store.add(catalog::ruler_tile(7.0, 1.0).unwrap());
        let doc = roundtrip(&store);
        match doc.tiles[0].kind {
            TileKind::Ruler { length } => assert!((length - 7.0).abs() < 1e-12),
            ref other => panic!("expected a ruler, got {other:?}"),
        }
    }

    #[test]
    fn test_ellipse_roundtrip() {
        let mut store = TileStore::new();
        let id = store
            .add(catalog::ellipse_tile(2.0, 1.0, Color::new(0xaa, 0xbb, 0xcc)).unwrap());
        store.set_transform(id, AffineTransform::translation(-4.0, 1.0));
        let doc = roundtrip(&store);
        let back = &doc.tiles[0];
        assert_eq!(back.kind, TileKind::Ellipse);
        match &back.geometry {
            TileGeometry::Ellipse(e) => {
                assert!((e.rx() - 2.0).abs() < 1e-12);
                assert!((e.ry() - 1.0).abs() < 1e-12);
            }
            _ => panic!("expected an ellipse"),
        }
        let c = back.transform.map_point(&Point::ORIGIN);
        assert!((c.x + 4.0).abs() < 1e-12 && (c.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_view_transform_recorded() {
        let mut viewport = Viewport::default();
        viewport.set_pan(Point::new(5.0, -2.0));
        viewport.zoom_by(1.5);
        let text = write_document(&TileStore::new(), &viewport);
        let doc = read_document(&text).unwrap();
        let view = doc.view_transform.unwrap();
        let (a, _, _, d, e, f) = view.coefficients();
        assert!((a - 1.5).abs() < 1e-12 && (d - 1.5).abs() < 1e-12);
        assert!((e - 5.0).abs() < 1e-12 && (f + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_read_foreign_svg_keeps_usable_shapes() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="100" height="100">
  <rect x="0" y="0" width="1" height="1" stroke="#00F" stroke-width=".01" fill="none" />
  <polygon points="0,0 1,0 1,1" stroke="purple" stroke-width=".03" fill="yellow" />
</svg>"##;
        let doc = read_document(svg).unwrap();
        assert_eq!(doc.tiles.len(), 1);
        assert_eq!(doc.tiles[0].fill, Color::default());
    }

    #[test]
    fn test_read_rejects_non_svg() {
        assert!(matches!(read_document("hello"), Err(SvgError::NotSvg)));
    }

    #[test]
    fn test_path_data_fallback() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg">
  <path d="M0,0 l1,0 l0,1 L0,1 Z" fill="#ff0000" />
</svg>"##;
        let doc = read_document(svg).unwrap();
        let tile = &doc.tiles[0];
        match &tile.geometry {
            TileGeometry::Polygon(p) => {
                assert_eq!(p.vertices().len(), 4);
                assert!(p.vertices()[2].distance_to(&Point::new(1.0, 1.0)) < 1e-12);
            }
            _ => panic!("expected a polygon"),
        }
        assert_eq!(tile.fill, Color::new(0xff, 0x00, 0x00));
    }

    #[test]
    fn test_transform_clauses_compose_right_to_left() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg">
  <polygon points="0,0 1,0 1,1" transform="translate(10 0) scale(2)" />
</svg>"##;
        let doc = read_document(svg).unwrap();
        let p = doc.tiles[0].transform.map_point(&Point::new(1.0, 1.0));
        assert!((p.x - 12.0).abs() < 1e-12 && (p.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_shorthand_colors_parse() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg">
  <polygon points="0,0 1,0 1,1" fill="#f0a" />
</svg>"##;
        let doc = read_document(svg).unwrap();
        assert_eq!(doc.tiles[0].fill, Color::new(0xff, 0x00, 0xaa));
    }

    #[test]
    fn test_malformed_points_error() {
        let svg = r#"<svg><polygon points="0,0 1" /></svg>"#;
        assert!(matches!(
            read_document(svg),
            Err(SvgError::MalformedAttribute { .. })
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.svg");
        let mut store = TileStore::new();
        store.add_tile(square_tile());
        save_document(&path, &store, &Viewport::default()).unwrap();
        let doc = load_document(&path).unwrap();
        assert_eq!(doc.tiles.len(), 1);
    }
}
