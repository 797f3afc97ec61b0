use thiserror::Error;

/// Errors produced by the trajectory engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Requested integrator name is not registered.
    #[error("Unknown integration method \"{0}\".")]
    UnknownMethod(String),

    /// The vector field is NaN or infinite at t = 0 for this initial condition.
    #[error("Vector field is undefined at initial condition ({x0}, {y0}).")]
    InvalidInitialCondition { x0: f64, y0: f64 },

    /// An existing trajectory already starts at this initial condition.
    #[error("A trajectory starting at ({x0}, {y0}) already exists.")]
    DuplicateInitialCondition { x0: f64, y0: f64 },

    /// Tangent at the tip has zero (or non-finite) on-screen length.
    #[error("Degenerate tangent vector at ({x}, {y}); direction indicator omitted.")]
    DegenerateTangent { x: f64, y: f64 },

    #[error("Trajectory has not been integrated yet.")]
    NotIntegrated,

    #[error("Marker has not been built yet.")]
    MarkerNotBuilt,

    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
