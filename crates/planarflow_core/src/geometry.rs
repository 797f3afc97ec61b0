use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned ellipse in data coordinates.
///
/// Width and height are chosen so the ellipse spans a fixed number of pixels on
/// both axes; it is a circle on screen even when it is not one in data space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point2<f64>,
    pub width: f64,
    pub height: f64,
}

impl Ellipse {
    pub fn new(center: Point2<f64>, width: f64, height: f64) -> Self {
        Self {
            center,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Point2<f64>) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 {
            return false;
        }
        let dx = (point.x - self.center.x) / (0.5 * self.width);
        let dy = (point.y - self.center.y) / (0.5 * self.height);
        dx * dx + dy * dy <= 1.0
    }
}

/// Arrowhead triangle in data coordinates: two base vertices, then the tip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [Point2<f64>; 3],
}

impl Triangle {
    pub fn tip(&self) -> Point2<f64> {
        self.vertices[2]
    }

    pub fn centroid(&self) -> Point2<f64> {
        let [a, b, c] = self.vertices;
        Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
    }
}

/// Renderable shape handed to the drawing layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Ellipse(Ellipse),
    Triangle(Triangle),
    /// Placeholder that keeps collections index-aligned when nothing is drawn.
    Empty,
}

/// Direction indicator state of one trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectionGeometry {
    /// Equilibrium: the indicator is the trajectory's own marker.
    Equilibrium,
    Directed(Triangle),
    /// Tip tangent had no on-screen length; nothing is drawn.
    Degenerate,
}
