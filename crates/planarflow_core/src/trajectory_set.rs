use crate::error::{EngineError, Result};
use crate::geometry::Shape;
use crate::settings::{FlowSettings, RenderStyle, Viewport};
use crate::solvers::IntegratorRegistry;
use crate::traits::VectorField;
use crate::trajectory::Trajectory;
use nalgebra::Point2;
use serde::Serialize;
use std::rc::Rc;

/// Two initial conditions closer than this on both axes are the same one.
pub const DUPLICATE_TOLERANCE: f64 = 1e-15;

/// Outcome of a bulk add.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AddReport {
    pub added: usize,
    pub duplicates: usize,
    /// Candidates where the field is NaN or infinite at t = 0.
    pub undefined: usize,
}

/// Ordered collection of trajectories sharing one viewport and render style.
///
/// Insertion order is preserved; `paths()`, `markers()` and `directions()` are
/// index-aligned.
#[derive(Debug)]
pub struct TrajectorySet {
    trajectories: Vec<Trajectory>,
    registry: IntegratorRegistry,
    viewport: Viewport,
    style: RenderStyle,
}

impl TrajectorySet {
    pub fn new(viewport: Viewport, style: RenderStyle) -> Result<Self> {
        Self::with_registry(viewport, style, IntegratorRegistry::default())
    }

    pub fn with_registry(
        viewport: Viewport,
        style: RenderStyle,
        registry: IntegratorRegistry,
    ) -> Result<Self> {
        viewport.validate()?;
        style.validate()?;
        Ok(Self {
            trajectories: Vec::new(),
            registry,
            viewport,
            style,
        })
    }

    /// Adds one trajectory per pair in the cartesian product of `x0s` and `y0s`.
    pub fn add(
        &mut self,
        x0s: &[f64],
        y0s: &[f64],
        field: &Rc<dyn VectorField<f64>>,
        settings: &FlowSettings,
    ) -> Result<AddReport> {
        let candidates = x0s
            .iter()
            .flat_map(|&x| y0s.iter().map(move |&y| (x, y)));
        self.add_candidates(candidates, field, settings)
    }

    /// Adds one trajectory per pre-paired initial condition.
    ///
    /// Duplicates and points where the field is undefined are skipped. An
    /// unknown method or invalid settings fail the call before anything is added.
    pub fn add_candidates<I>(
        &mut self,
        candidates: I,
        field: &Rc<dyn VectorField<f64>>,
        settings: &FlowSettings,
    ) -> Result<AddReport>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        settings.validate()?;
        if !self.registry.contains(&settings.method) {
            return Err(EngineError::UnknownMethod(settings.method.clone()));
        }

        let mut report = AddReport::default();
        for (x0, y0) in candidates {
            match self.try_add(x0, y0, field, settings) {
                Ok(()) => report.added += 1,
                Err(EngineError::DuplicateInitialCondition { .. }) => {
                    tracing::debug!(x0, y0, "skipping duplicate initial condition");
                    report.duplicates += 1;
                }
                Err(EngineError::InvalidInitialCondition { .. }) => {
                    tracing::debug!(x0, y0, "skipping initial condition where the field is undefined");
                    report.undefined += 1;
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!(
            added = report.added,
            duplicates = report.duplicates,
            undefined = report.undefined,
            total = self.trajectories.len(),
            method = %settings.method,
            "added trajectories"
        );
        Ok(report)
    }

    fn try_add(
        &mut self,
        x0: f64,
        y0: f64,
        field: &Rc<dyn VectorField<f64>>,
        settings: &FlowSettings,
    ) -> Result<()> {
        if self.contains(x0, y0) {
            return Err(EngineError::DuplicateInitialCondition { x0, y0 });
        }
        if field.is_undefined_at(0.0, x0, y0) {
            return Err(EngineError::InvalidInitialCondition { x0, y0 });
        }

        let mut trajectory = Trajectory::new(x0, y0, Rc::clone(field), settings.tmax, settings.dt);
        trajectory.run_integration(&settings.method, &self.registry)?;
        trajectory.build_path()?;
        trajectory.build_marker(self.style.marker_diameter_px, &self.viewport);
        trajectory.build_direction(self.style.arrowhead_size_px, &self.viewport)?;
        self.trajectories.push(trajectory);
        Ok(())
    }

    /// True if a stored trajectory starts within tolerance of (x0, y0).
    pub fn contains(&self, x0: f64, y0: f64) -> bool {
        self.trajectories.iter().any(|t| {
            (t.x0() - x0).abs() < DUPLICATE_TOLERANCE && (t.y0() - y0).abs() < DUPLICATE_TOLERANCE
        })
    }

    /// Re-fits every marker and direction indicator to `viewport`. Never re-integrates.
    pub fn on_viewport_change(&mut self, viewport: Viewport, style: RenderStyle) -> Result<()> {
        viewport.validate()?;
        style.validate()?;
        self.viewport = viewport;
        self.style = style;
        for trajectory in &mut self.trajectories {
            trajectory.resize_marker(style.marker_diameter_px, &viewport)?;
            trajectory.resize_direction(style.arrowhead_size_px, &viewport)?;
        }
        tracing::debug!(count = self.trajectories.len(), "refitted trajectory geometry");
        Ok(())
    }

    /// Drops every trajectory, e.g. when the vector field is replaced.
    pub fn reset(&mut self) {
        tracing::debug!(count = self.trajectories.len(), "clearing trajectories");
        self.trajectories.clear();
    }

    /// Places each marker at `path[frame]`, or back at its origin once past the end.
    pub fn advance_animation_frame(&mut self, frame: usize) {
        for trajectory in &mut self.trajectories {
            match trajectory.path().get(frame).copied() {
                Some(point) => trajectory.move_marker_to(point),
                None => trajectory.reset_marker(),
            }
        }
    }

    /// Frames `0..=max path length`; the last frame returns markers to their origins.
    pub fn animation_frame_count(&self) -> usize {
        self.trajectories
            .iter()
            .map(|t| t.path().len())
            .max()
            .map_or(0, |len| len + 1)
    }

    pub fn paths(&self) -> Vec<&[Point2<f64>]> {
        self.trajectories.iter().map(Trajectory::path).collect()
    }

    pub fn markers(&self) -> Vec<Shape> {
        self.trajectories.iter().map(Trajectory::marker_shape).collect()
    }

    pub fn directions(&self) -> Vec<Shape> {
        self.trajectories.iter().map(Trajectory::direction).collect()
    }

    /// Lookup by exact stored initial condition.
    pub fn trajectory_at(&self, x0: f64, y0: f64) -> Option<&Trajectory> {
        self.trajectories
            .iter()
            .find(|t| t.x0() == x0 && t.y0() == y0)
    }

    /// Index of the first trajectory whose marker covers the data point.
    pub fn marker_at(&self, x: f64, y: f64) -> Option<usize> {
        let point = Point2::new(x, y);
        self.trajectories
            .iter()
            .position(|t| t.marker().is_some_and(|m| m.contains(point)))
    }

    /// Initial conditions whose direction indicator had to be omitted.
    pub fn degenerate_directions(&self) -> Vec<(f64, f64)> {
        self.trajectories
            .iter()
            .filter(|t| t.has_degenerate_direction())
            .map(|t| (t.x0(), t.y0()))
            .collect()
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    pub fn registry_mut(&mut self) -> &mut IntegratorRegistry {
        &mut self.registry
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn get(&self, index: usize) -> Option<&Trajectory> {
        self.trajectories.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trajectory> {
        self.trajectories.iter()
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }
}
