pub mod error;
pub mod geometry;
pub mod graph;
pub mod sampling;
pub mod settings;
pub mod solvers;
/// The `planarflow_core` crate integrates planar, possibly time-varying flows
/// `x' = f(t, x, y)`, `y' = g(t, x, y)` and turns each solution into
/// screen-ready geometry for a phase portrait.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `VectorField` (the flow), `Steppable` (single-step schemes).
/// - **Solvers**: Fixed-step Euler, RK2 and RK4 integrators plus a name-keyed `IntegratorRegistry`.
/// - **Trajectories**: Path, start marker and arrowhead for one initial condition, collected in a `TrajectorySet`.
/// - **Transform**: Linear data/pixel mapping used to keep markers a fixed on-screen size.
/// - **Sampling** and **Graph**: Initial-condition grids and implicit-curve overlays.
pub mod traits;
pub mod trajectory;
pub mod trajectory_set;
pub mod transform;

pub use error::{EngineError, Result};
