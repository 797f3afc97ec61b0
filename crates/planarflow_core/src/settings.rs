use crate::error::{EngineError, Result};
use crate::solvers::Method;
use crate::transform::AxisScale;
use serde::{Deserialize, Serialize};

/// Visible data-space extent together with its pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            xmin: -10.0,
            xmax: 10.0,
            ymin: -10.0,
            ymax: 10.0,
            pixel_width: 800.0,
            pixel_height: 800.0,
        }
    }
}

impl Viewport {
    pub fn new(
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
        pixel_width: f64,
        pixel_height: f64,
    ) -> Result<Self> {
        let viewport = Self {
            xmin,
            xmax,
            ymin,
            ymax,
            pixel_width,
            pixel_height,
        };
        viewport.validate()?;
        Ok(viewport)
    }

    pub fn validate(&self) -> Result<()> {
        let values = [
            self.xmin,
            self.xmax,
            self.ymin,
            self.ymax,
            self.pixel_width,
            self.pixel_height,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::InvalidViewport(
                "all extents must be finite".to_string(),
            ));
        }
        if self.xmin >= self.xmax {
            return Err(EngineError::InvalidViewport(format!(
                "xmin ({}) must be less than xmax ({})",
                self.xmin, self.xmax
            )));
        }
        if self.ymin >= self.ymax {
            return Err(EngineError::InvalidViewport(format!(
                "ymin ({}) must be less than ymax ({})",
                self.ymin, self.ymax
            )));
        }
        if !(self.xmax - self.xmin).is_finite() || !(self.ymax - self.ymin).is_finite() {
            return Err(EngineError::InvalidViewport(
                "extent span must be finite".to_string(),
            ));
        }
        if self.pixel_width <= 0.0 || self.pixel_height <= 0.0 {
            return Err(EngineError::InvalidViewport(
                "pixel dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn x_axis(&self) -> AxisScale {
        AxisScale::new(self.xmin, self.xmax, self.pixel_width)
    }

    pub fn y_axis(&self) -> AxisScale {
        AxisScale::new(self.ymin, self.ymax, self.pixel_height)
    }
}

/// Integration parameters shared by every trajectory added in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    pub tmax: f64,
    pub dt: f64,
    /// Registry name of the integrator, e.g. "Euler", "RK2", "RK4".
    pub method: String,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            tmax: 10.0,
            dt: 0.01,
            method: Method::Rk2.name().to_string(),
        }
    }
}

impl FlowSettings {
    pub fn new(tmax: f64, dt: f64, method: impl Into<String>) -> Self {
        Self {
            tmax,
            dt,
            method: method.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tmax.is_finite() || self.tmax <= 0.0 {
            return Err(EngineError::InvalidSettings(
                "tmax must be positive".to_string(),
            ));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(EngineError::InvalidSettings(
                "dt must be positive".to_string(),
            ));
        }
        // A path needs at least two samples for its tip tangent to exist.
        if self.tmax < self.dt {
            return Err(EngineError::InvalidSettings(
                "tmax must be greater than or equal to dt".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pixel sizes of the derived per-trajectory geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub marker_diameter_px: f64,
    pub arrowhead_size_px: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            marker_diameter_px: 10.0,
            arrowhead_size_px: 8.0,
        }
    }
}

impl RenderStyle {
    pub fn validate(&self) -> Result<()> {
        if !self.marker_diameter_px.is_finite() || self.marker_diameter_px <= 0.0 {
            return Err(EngineError::InvalidSettings(
                "marker diameter must be positive".to_string(),
            ));
        }
        if !self.arrowhead_size_px.is_finite() || self.arrowhead_size_px <= 0.0 {
            return Err(EngineError::InvalidSettings(
                "arrowhead size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Controls for randomly drawn initial conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    /// Number of draws for each `InitialValues::Random` list.
    pub random_count: usize,
    pub seed: u64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            random_count: 10,
            seed: 0x5eed_f10e,
        }
    }
}
