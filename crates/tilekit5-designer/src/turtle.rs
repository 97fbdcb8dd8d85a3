//! Math-turtle polygon builder.
//!
//! A small turtle (position + heading) used by the shape catalog to
//! construct tile outlines. The turtle records visited positions while the
//! pen is down; `polygon()` returns the recorded outline.
//!
//! Angles are positive counterclockwise. Headings are kept in radians
//! internally; the degree methods are the ones the catalog uses.

use std::f64::consts::PI;
use tilekit5_core::Point;

/// A recording math turtle.
///
/// Pen-up commands stack: every `pen_up` requires a matching `pen_down`
/// before movements are recorded again. This lets a construction routine
/// call a sub-procedure that manages the pen itself without the caller's
/// pen state being clobbered. `pen_down` never raises the level above one.
#[derive(Debug, Clone)]
pub struct Turtle {
    pos: Point,
    heading: f64,
    pen_level: i32,
    vertices: Vec<Point>,
    polygons: Vec<Vec<Point>>,
}

impl Turtle {
    /// Creates a turtle at the origin, heading along +x, pen down.
    pub fn new() -> Self {
        Self::at(Point::ORIGIN, 0.0)
    }

    /// Creates a turtle at `pos` with the given heading in degrees.
    pub fn at(pos: Point, heading_degrees: f64) -> Self {
        Self {
            pos,
            heading: heading_degrees.to_radians(),
            pen_level: 1,
            vertices: vec![pos],
            polygons: Vec::new(),
        }
    }

    /// Current position.
    pub fn pos(&self) -> Point {
        self.pos
    }

    /// Current heading in degrees.
    pub fn heading_degrees(&self) -> f64 {
        self.heading.to_degrees()
    }

    /// Turn left (counterclockwise) by degrees.
    pub fn lt(&mut self, degrees: f64) -> &mut Self {
        self.lt_radians(degrees.to_radians())
    }

    /// Turn right (clockwise) by degrees.
    pub fn rt(&mut self, degrees: f64) -> &mut Self {
        self.lt_radians(-degrees.to_radians())
    }

    /// Turn left by radians.
    pub fn lt_radians(&mut self, radians: f64) -> &mut Self {
        self.heading = (self.heading + radians) % (2.0 * PI);
        self
    }

    /// Move forward by `r`, recording the new position if the pen is down.
    pub fn fd(&mut self, r: f64) -> &mut Self {
        let target = Point::new(
            self.pos.x + r * self.heading.cos(),
            self.pos.y + r * self.heading.sin(),
        );
        self.goto(target)
    }

    /// Move backward by `r` without changing heading.
    pub fn bk(&mut self, r: f64) -> &mut Self {
        self.fd(-r)
    }

    /// Jump to an absolute position, recording it if the pen is down.
    pub fn goto(&mut self, pos: Point) -> &mut Self {
        self.pos = pos;
        if self.pen_level > 0 {
            self.vertices.push(pos);
        }
        self
    }

    /// Turn to face `point`.
    pub fn turn_towards(&mut self, point: Point) -> &mut Self {
        let theta = self.radians_to(point);
        self.lt_radians(theta)
    }

    /// Relative angle to `point` in radians, in the range (-pi, pi].
    pub fn radians_to(&self, point: Point) -> f64 {
        let d = point - self.pos;
        let mut theta = d.y.atan2(d.x) - self.heading;
        if theta > PI {
            theta -= 2.0 * PI;
        } else if theta <= -PI {
            theta += 2.0 * PI;
        }
        theta
    }

    /// Raise the pen one level, finishing the polygon drawn so far.
    pub fn pen_up(&mut self) -> &mut Self {
        self.pen_level -= 1;
        if self.vertices.len() > 1 {
            self.polygons.push(std::mem::take(&mut self.vertices));
        } else {
            self.vertices.clear();
        }
        self
    }

    /// Lower the pen one level (never above one). A fresh polygon starts
    /// at the current position only when the pen actually lands.
    pub fn pen_down(&mut self) -> &mut Self {
        self.pen_level += 1;
        if self.pen_level > 1 {
            self.pen_level = 1;
        } else if self.pen_level == 1 {
            self.vertices = vec![self.pos];
        }
        self
    }

    /// Vertices of the polygon currently being drawn.
    pub fn polygon(&self) -> Vec<Point> {
        self.vertices.clone()
    }

    /// All polygons drawn, including the one in progress.
    pub fn polygons(&self) -> Vec<Vec<Point>> {
        let mut polys = self.polygons.clone();
        if !self.vertices.is_empty() {
            polys.push(self.vertices.clone());
        }
        polys
    }
}

impl Default for Turtle {
    fn default() -> Self {
        Self::new()
    }
}
