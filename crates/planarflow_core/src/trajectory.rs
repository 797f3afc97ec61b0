use crate::error::{EngineError, Result};
use crate::geometry::{DirectionGeometry, Ellipse, Shape, Triangle};
use crate::settings::Viewport;
use crate::solvers::{IntegrationResult, IntegratorRegistry};
use crate::traits::VectorField;
use nalgebra::{Point2, Vector2};
use std::fmt;
use std::rc::Rc;

/// Both field components must fall below this at t = 0 for an equilibrium.
pub const EQUILIBRIUM_TOLERANCE: f64 = 1e-15;

/// One initial condition, its integrated path, and its display geometry.
///
/// Geometry (marker and direction indicator) is derived from the stored series
/// and the viewport, so it can be rebuilt for a new viewport without
/// re-integrating.
pub struct Trajectory {
    x0: f64,
    y0: f64,
    field: Rc<dyn VectorField<f64>>,
    tmax: f64,
    dt: f64,
    is_equilibrium: bool,
    result: Option<IntegrationResult>,
    path: Vec<Point2<f64>>,
    marker: Option<Ellipse>,
    direction: Option<DirectionGeometry>,
}

impl Trajectory {
    pub fn new(x0: f64, y0: f64, field: Rc<dyn VectorField<f64>>, tmax: f64, dt: f64) -> Self {
        let (u, v) = field.velocity(0.0, x0, y0);
        let is_equilibrium = u.abs() < EQUILIBRIUM_TOLERANCE && v.abs() < EQUILIBRIUM_TOLERANCE;
        Self {
            x0,
            y0,
            field,
            tmax,
            dt,
            is_equilibrium,
            result: None,
            path: Vec::new(),
            marker: None,
            direction: None,
        }
    }

    pub fn run_integration(&mut self, method: &str, registry: &IntegratorRegistry) -> Result<()> {
        let integrator = registry.get(method)?;
        self.result = Some(integrator(
            self.field.as_ref(),
            self.x0,
            self.y0,
            self.tmax,
            self.dt,
        ));
        Ok(())
    }

    /// Projects the integrated series onto the (x, y) plane, in time order.
    pub fn build_path(&mut self) -> Result<()> {
        let result = self.result.as_ref().ok_or(EngineError::NotIntegrated)?;
        self.path = result
            .x
            .iter()
            .zip(&result.y)
            .map(|(&x, &y)| Point2::new(x, y))
            .collect();
        Ok(())
    }

    pub fn build_marker(&mut self, diameter_px: f64, viewport: &Viewport) {
        let (width, height) = marker_extent(diameter_px, viewport);
        self.marker = Some(Ellipse::new(self.initial_point(), width, height));
    }

    /// Recomputes the marker's data-space size; its center is left where it is.
    pub fn resize_marker(&mut self, diameter_px: f64, viewport: &Viewport) -> Result<()> {
        let marker = self.marker.as_mut().ok_or(EngineError::MarkerNotBuilt)?;
        let (width, height) = marker_extent(diameter_px, viewport);
        marker.width = width;
        marker.height = height;
        Ok(())
    }

    pub fn build_direction(&mut self, size_px: f64, viewport: &Viewport) -> Result<()> {
        if self.is_equilibrium {
            self.direction = Some(DirectionGeometry::Equilibrium);
            return Ok(());
        }

        let (t, x, y) = self
            .result
            .as_ref()
            .and_then(IntegrationResult::last)
            .ok_or(EngineError::NotIntegrated)?;
        let tangent = self.field.velocity(t, x, y);

        let direction = match arrowhead(Point2::new(x, y), tangent, size_px, viewport) {
            Ok(triangle) => DirectionGeometry::Directed(triangle),
            Err(err) => {
                tracing::warn!(x0 = self.x0, y0 = self.y0, error = %err, "direction indicator omitted");
                DirectionGeometry::Degenerate
            }
        };
        self.direction = Some(direction);
        Ok(())
    }

    /// Rebuilds the arrowhead for `viewport`. No-op for equilibria.
    pub fn resize_direction(&mut self, size_px: f64, viewport: &Viewport) -> Result<()> {
        if self.is_equilibrium && self.direction.is_some() {
            return Ok(());
        }
        self.build_direction(size_px, viewport)
    }

    /// Moves the marker center, e.g. to an animation frame's sample.
    pub fn move_marker_to(&mut self, point: Point2<f64>) {
        if let Some(marker) = self.marker.as_mut() {
            marker.center = point;
        }
    }

    pub fn reset_marker(&mut self) {
        let origin = self.initial_point();
        self.move_marker_to(origin);
    }

    pub fn x0(&self) -> f64 {
        self.x0
    }

    pub fn y0(&self) -> f64 {
        self.y0
    }

    pub fn initial_point(&self) -> Point2<f64> {
        Point2::new(self.x0, self.y0)
    }

    pub fn tmax(&self) -> f64 {
        self.tmax
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn is_equilibrium(&self) -> bool {
        self.is_equilibrium
    }

    pub fn field(&self) -> &Rc<dyn VectorField<f64>> {
        &self.field
    }

    /// The (t, x, y) series, once integrated.
    pub fn time_series(&self) -> Option<&IntegrationResult> {
        self.result.as_ref()
    }

    pub fn path(&self) -> &[Point2<f64>] {
        &self.path
    }

    pub fn marker(&self) -> Option<&Ellipse> {
        self.marker.as_ref()
    }

    pub fn direction_geometry(&self) -> Option<&DirectionGeometry> {
        self.direction.as_ref()
    }

    pub fn marker_shape(&self) -> Shape {
        self.marker.map(Shape::Ellipse).unwrap_or(Shape::Empty)
    }

    /// Shape drawn at the tip. Equilibria resolve to a copy of the marker.
    pub fn direction(&self) -> Shape {
        match self.direction {
            Some(DirectionGeometry::Equilibrium) => self.marker_shape(),
            Some(DirectionGeometry::Directed(triangle)) => Shape::Triangle(triangle),
            Some(DirectionGeometry::Degenerate) | None => Shape::Empty,
        }
    }

    pub fn has_degenerate_direction(&self) -> bool {
        matches!(self.direction, Some(DirectionGeometry::Degenerate))
    }
}

impl fmt::Debug for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trajectory")
            .field("x0", &self.x0)
            .field("y0", &self.y0)
            .field("tmax", &self.tmax)
            .field("dt", &self.dt)
            .field("is_equilibrium", &self.is_equilibrium)
            .field("samples", &self.path.len())
            .field("marker", &self.marker)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

/// Data-space width and height of a marker `diameter_px` pixels across.
fn marker_extent(diameter_px: f64, viewport: &Viewport) -> (f64, f64) {
    (
        viewport.x_axis().from_pixel_delta(diameter_px),
        viewport.y_axis().from_pixel_delta(diameter_px),
    )
}

/// Builds an isosceles arrowhead at `tip` pointing along `tangent`.
///
/// The shape is laid out in pixel space so it reflects the on-screen angle,
/// then converted back to data coordinates.
fn arrowhead(
    tip: Point2<f64>,
    tangent: (f64, f64),
    size_px: f64,
    viewport: &Viewport,
) -> Result<Triangle> {
    let x_axis = viewport.x_axis();
    let y_axis = viewport.y_axis();
    let degenerate = || EngineError::DegenerateTangent { x: tip.x, y: tip.y };

    let on_screen = Vector2::new(x_axis.to_pixel_delta(tangent.0), y_axis.to_pixel_delta(tangent.1));
    if !(on_screen.x.is_finite() && on_screen.y.is_finite()) {
        return Err(degenerate());
    }
    let u = on_screen.try_normalize(f64::EPSILON).ok_or_else(degenerate)?;
    let normal = Vector2::new(-u.y, u.x);

    let tip_px = Point2::new(x_axis.to_pixel(tip.x), y_axis.to_pixel(tip.y));
    if !(tip_px.x.is_finite() && tip_px.y.is_finite()) {
        return Err(degenerate());
    }

    let back = tip_px - u * size_px;
    let vertices_px = [back + normal * size_px, back - normal * size_px, tip_px + u * size_px];
    let vertices = vertices_px.map(|p| Point2::new(x_axis.from_pixel(p.x), y_axis.from_pixel(p.y)));
    Ok(Triangle { vertices })
}
