use crate::error::{EngineError, Result};
use crate::settings::Viewport;
use nalgebra::Point2;
use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// Default grid resolution per axis.
pub const DEFAULT_SAMPLES: usize = 200;

/// Line segment of a contour, in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

/// Zero set of `F(x, y)` clipped to a domain, e.g. a nullcline overlay.
///
/// The contour depends on the viewport, so hosts call [`ImplicitCurve::rebuild`]
/// whenever it changes.
pub struct ImplicitCurve {
    equation: Rc<dyn Fn(f64, f64) -> f64>,
    x_domain: (f64, f64),
    y_domain: (f64, f64),
    samples: usize,
    segments: Vec<Segment>,
}

impl ImplicitCurve {
    pub fn new(equation: Rc<dyn Fn(f64, f64) -> f64>) -> Self {
        Self {
            equation,
            x_domain: (f64::NEG_INFINITY, f64::INFINITY),
            y_domain: (f64::NEG_INFINITY, f64::INFINITY),
            samples: DEFAULT_SAMPLES,
            segments: Vec::new(),
        }
    }

    pub fn with_domain(mut self, x_domain: (f64, f64), y_domain: (f64, f64)) -> Result<Self> {
        for (name, (low, high)) in [("x", x_domain), ("y", y_domain)] {
            if low.is_nan() || high.is_nan() || low >= high {
                return Err(EngineError::InvalidRange(format!(
                    "lower bound for {name} must be less than its upper bound"
                )));
            }
        }
        self.x_domain = x_domain;
        self.y_domain = y_domain;
        Ok(self)
    }

    pub fn with_samples(mut self, samples: usize) -> Result<Self> {
        if samples < 2 {
            return Err(EngineError::InvalidSettings(
                "contour grid needs at least 2 samples per axis".to_string(),
            ));
        }
        self.samples = samples;
        Ok(self)
    }

    /// Re-samples the equation over the part of the domain inside `viewport`.
    pub fn rebuild(&mut self, viewport: &Viewport) -> Result<()> {
        viewport.validate()?;
        self.segments.clear();

        let x0 = self.x_domain.0.max(viewport.xmin);
        let x1 = self.x_domain.1.min(viewport.xmax);
        let y0 = self.y_domain.0.max(viewport.ymin);
        let y1 = self.y_domain.1.min(viewport.ymax);
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }

        self.segments = zero_level_segments(self.equation.as_ref(), (x0, x1), (y0, y1), self.samples);
        tracing::debug!(segments = self.segments.len(), "rebuilt implicit curve");
        Ok(())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn x_domain(&self) -> (f64, f64) {
        self.x_domain
    }

    pub fn y_domain(&self) -> (f64, f64) {
        self.y_domain
    }
}

impl fmt::Debug for ImplicitCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplicitCurve")
            .field("x_domain", &self.x_domain)
            .field("y_domain", &self.y_domain)
            .field("samples", &self.samples)
            .field("segments", &self.segments.len())
            .finish_non_exhaustive()
    }
}

fn zero_level_segments(
    equation: &dyn Fn(f64, f64) -> f64,
    (x_min, x_max): (f64, f64),
    (y_min, y_max): (f64, f64),
    samples: usize,
) -> Vec<Segment> {
    let n = samples.max(2);
    let step_x = (x_max - x_min) / (n - 1) as f64;
    let step_y = (y_max - y_min) / (n - 1) as f64;
    let index = |ix: usize, iy: usize| -> usize { ix + iy * n };

    let mut values = vec![0.0; n * n];
    for iy in 0..n {
        let y = y_min + step_y * iy as f64;
        for ix in 0..n {
            let x = x_min + step_x * ix as f64;
            values[index(ix, iy)] = equation(x, y);
        }
    }

    let mut segments = Vec::new();
    for iy in 0..n - 1 {
        let y0 = y_min + step_y * iy as f64;
        let y1 = y_min + step_y * (iy + 1) as f64;
        for ix in 0..n - 1 {
            let x0 = x_min + step_x * ix as f64;
            let x1 = x_min + step_x * (ix + 1) as f64;
            let corners = [
                values[index(ix, iy)],
                values[index(ix + 1, iy)],
                values[index(ix + 1, iy + 1)],
                values[index(ix, iy + 1)],
            ];
            // Skip cells touching a singularity or outside the equation's domain.
            if corners.iter().any(|v| !v.is_finite()) {
                continue;
            }

            let case_index = corners
                .iter()
                .enumerate()
                .filter(|(_, v)| **v >= 0.0)
                .fold(0u8, |acc, (bit, _)| acc | (1 << bit));

            for &(edge_a, edge_b) in marching_squares_edge_pairs(case_index) {
                segments.push(Segment {
                    start: interpolate_square_edge(edge_a, (x0, x1), (y0, y1), &corners),
                    end: interpolate_square_edge(edge_b, (x0, x1), (y0, y1), &corners),
                });
            }
        }
    }
    segments
}

fn marching_squares_edge_pairs(case_index: u8) -> &'static [(u8, u8)] {
    match case_index {
        0 | 15 => &[],
        1 => &[(3, 0)],
        2 => &[(0, 1)],
        3 => &[(3, 1)],
        4 => &[(1, 2)],
        5 => &[(3, 2), (0, 1)],
        6 => &[(0, 2)],
        7 => &[(3, 2)],
        8 => &[(2, 3)],
        9 => &[(0, 2)],
        10 => &[(0, 3), (1, 2)],
        11 => &[(1, 2)],
        12 => &[(1, 3)],
        13 => &[(0, 1)],
        14 => &[(3, 0)],
        _ => &[],
    }
}

/// Point on cell edge `edge` (0 bottom, 1 right, 2 top, 3 left) where the
/// linear interpolant of the corner values crosses zero.
fn interpolate_square_edge(
    edge: u8,
    (x0, x1): (f64, f64),
    (y0, y1): (f64, f64),
    v: &[f64; 4],
) -> Point2<f64> {
    match edge {
        0 => Point2::new(x0 + (x1 - x0) * interpolate_factor(v[0], v[1]), y0),
        1 => Point2::new(x1, y0 + (y1 - y0) * interpolate_factor(v[1], v[2])),
        2 => Point2::new(x1 + (x0 - x1) * interpolate_factor(v[2], v[3]), y1),
        3 => Point2::new(x0, y1 + (y0 - y1) * interpolate_factor(v[3], v[0])),
        _ => Point2::new(x0, y0),
    }
}

fn interpolate_factor(v0: f64, v1: f64) -> f64 {
    let denom = v0 - v1;
    if denom.abs() <= f64::EPSILON {
        0.5
    } else {
        (v0 / denom).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(equation: impl Fn(f64, f64) -> f64 + 'static) -> ImplicitCurve {
        ImplicitCurve::new(Rc::new(equation))
    }

    #[test]
    fn circle_contour_lies_on_the_circle() {
        let viewport = Viewport::new(-2.0, 2.0, -2.0, 2.0, 400.0, 400.0).expect("viewport");
        let mut circle = curve(|x, y| x * x + y * y - 1.0);
        circle.rebuild(&viewport).expect("rebuild");
        assert!(!circle.segments().is_empty());
        for segment in circle.segments() {
            for p in [segment.start, segment.end] {
                let r = (p.x * p.x + p.y * p.y).sqrt();
                assert!((r - 1.0).abs() < 1e-3, "radius {r}");
            }
        }
    }

    #[test]
    fn rebuild_follows_a_narrower_viewport() {
        let mut circle = curve(|x, y| x * x + y * y - 1.0);
        circle.rebuild(&Viewport::default()).expect("rebuild");
        let wide = circle.segments().to_vec();
        assert!(wide.iter().any(|s| s.start.x < 0.0));

        let quadrant = Viewport::new(0.0, 2.0, 0.0, 2.0, 200.0, 200.0).expect("viewport");
        circle.rebuild(&quadrant).expect("rebuild");
        assert!(!circle.segments().is_empty());
        assert_ne!(circle.segments(), wide.as_slice());
        for segment in circle.segments() {
            for p in [segment.start, segment.end] {
                assert!(p.x >= 0.0 && p.y >= 0.0, "point {p:?} outside the viewport");
                assert!(((p.x * p.x + p.y * p.y).sqrt() - 1.0).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn domain_clips_the_contour() {
        let viewport = Viewport::default();
        let mut line = curve(|x, y| y - x)
            .with_domain((0.0, f64::INFINITY), (f64::NEG_INFINITY, f64::INFINITY))
            .expect("domain");
        line.rebuild(&viewport).expect("rebuild");
        assert!(!line.segments().is_empty());
        assert!(line
            .segments()
            .iter()
            .all(|s| s.start.x >= 0.0 && s.end.x >= 0.0));
    }

    #[test]
    fn domain_outside_viewport_yields_nothing() {
        let viewport = Viewport::default();
        let mut line = curve(|x, y| y - x)
            .with_domain((20.0, 30.0), (f64::NEG_INFINITY, f64::INFINITY))
            .expect("domain");
        line.rebuild(&viewport).expect("rebuild");
        assert!(line.segments().is_empty());
    }

    #[test]
    fn singular_cells_are_skipped() {
        let viewport = Viewport::new(-1.0, 1.0, -1.0, 1.0, 100.0, 100.0).expect("viewport");
        let mut hyperbola = curve(|x, _y| 1.0 / x).with_samples(11).expect("samples");
        hyperbola.rebuild(&viewport).expect("rebuild");
        // The sign change across the pole at x = 0 is not a zero crossing.
        assert!(hyperbola.segments().is_empty());
    }

    #[test]
    fn inverted_domain_is_rejected() {
        let err = curve(|x, _y| x)
            .with_domain((1.0, -1.0), (0.0, 1.0))
            .expect_err("inverted");
        assert!(format!("{err}").contains("lower bound for x"));
    }
}
