//! Polyform outline construction.
//!
//! Polyominoes and polyiamonds are described as ASCII-style cell patterns
//! (rows of 0/1 flags). A cell scan emits one boundary segment for every
//! on/off border, and `chain_segments` orders the resulting segment soup
//! into a single closed vertex loop.
//!
//! Segment endpoints are compared for exact equality. Both scans derive
//! coordinates from small-integer cell indices with exact f64 arithmetic,
//! so shared endpoints of neighboring cells compare equal.

use tilekit5_core::{Point, TileError};

/// An undirected boundary segment between two cell corners.
pub type Segment = (Point, Point);

fn cell(pattern: &[&[u8]], x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 {
        return 0;
    }
    let (x, y) = (x as usize, y as usize);
    if y >= pattern.len() || x >= pattern[y].len() {
        return 0;
    }
    pattern[y][x]
}

/// Boundary segments of a polyomino on the unit square grid.
///
/// Cell `(x, y)` occupies the unit square with top-left corner `(x, y)`;
/// rows grow downward in pattern space.
pub fn square_cell_scan(pattern: &[&[u8]]) -> Vec<Segment> {
    let mut segs = Vec::new();
    for y in 0..pattern.len() {
        for x in 0..pattern[y].len() {
            if pattern[y][x] == 0 {
                continue;
            }
            let (xf, yf) = (x as f64, y as f64);
            let (xi, yi) = (x as i32, y as i32);
            if cell(pattern, xi, yi - 1) == 0 {
                segs.push((Point::new(xf, yf), Point::new(xf + 1.0, yf)));
            }
            if cell(pattern, xi - 1, yi) == 0 {
                segs.push((Point::new(xf, yf), Point::new(xf, yf + 1.0)));
            }
            if cell(pattern, xi + 1, yi) == 0 {
                segs.push((Point::new(xf + 1.0, yf), Point::new(xf + 1.0, yf + 1.0)));
            }
            if cell(pattern, xi, yi + 1) == 0 {
                segs.push((Point::new(xf, yf + 1.0), Point::new(xf + 1.0, yf + 1.0)));
            }
        }
    }
    segs
}

/// Boundary segments of a polyiamond on the sheared triangle grid.
///
/// A rectangular pattern is interpreted as a row of alternating
/// downward-pointing (even column) and upward-pointing (odd column)
/// unit triangles; each row is offset half a cell and rows are
/// `sqrt(3)/2` tall.
pub fn triangle_cell_scan(pattern: &[&[u8]]) -> Vec<Segment> {
    let h = 3f64.sqrt() / 2.0;
    let mut segs = Vec::new();
    for y in 0..pattern.len() {
        for x in 0..pattern[y].len() {
            if pattern[y][x] == 0 {
                continue;
            }
            let (xi, yi) = (x as i32, y as i32);
            let row = y as f64;
            if x % 2 == 0 {
                // Downward-pointing triangle: top-left, top-right, bottom.
                let topl = Point::new((x + y) as f64 / 2.0, row * h);
                let topr = Point::new((x + y) as f64 / 2.0 + 1.0, row * h);
                let bot = Point::new((x + y + 1) as f64 / 2.0, (row + 1.0) * h);
                if cell(pattern, xi + 1, yi - 1) == 0 {
                    segs.push((topl, topr));
                }
                if cell(pattern, xi - 1, yi) == 0 {
                    segs.push((topl, bot));
                }
                if cell(pattern, xi + 1, yi) == 0 {
                    segs.push((topr, bot));
                }
            } else {
                // Upward-pointing triangle: top, bottom-left, bottom-right.
                let top = Point::new((x + y + 1) as f64 / 2.0, row * h);
                let botl = Point::new((x + y) as f64 / 2.0, (row + 1.0) * h);
                let botr = Point::new((x + y) as f64 / 2.0 + 1.0, (row + 1.0) * h);
                if cell(pattern, xi - 1, yi + 1) == 0 {
                    segs.push((botl, botr));
                }
                if cell(pattern, xi - 1, yi) == 0 {
                    segs.push((top, botl));
                }
                if cell(pattern, xi + 1, yi) == 0 {
                    segs.push((top, botr));
                }
            }
        }
    }
    segs
}

/// Orders an unordered segment soup into a closed vertex loop.
///
/// Seeds the loop with an arbitrary segment, then repeatedly finds the
/// segment sharing the current loop end. Disconnected input cannot be
/// chained and is rejected.
pub fn chain_segments(mut segs: Vec<Segment>) -> Result<Vec<Point>, TileError> {
    let total = segs.len();
    if total == 0 {
        return Err(TileError::EmptyPattern);
    }

    let (a, b) = segs.pop().ok_or(TileError::EmptyPattern)?;
    let mut loop_points = vec![a, b];
    let mut p = b;
    while !segs.is_empty() {
        let found = segs.iter().position(|&(s, e)| s == p || e == p);
        match found {
            Some(i) => {
                let (s, e) = segs.remove(i);
                p = if s == p { e } else { s };
                loop_points.push(p);
            }
            None => {
                return Err(TileError::UnchainableSegments {
                    remaining: segs.len(),
                    total,
                })
            }
        }
    }
    Ok(loop_points)
}

/// Chains a scan result into an outline, dropping the duplicated closing
/// vertex.
pub fn outline_from_segments(segs: Vec<Segment>) -> Result<Vec<Point>, TileError> {
    let mut points = chain_segments(segs)?;
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Ok(points)
}
