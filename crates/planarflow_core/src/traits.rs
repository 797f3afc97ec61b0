use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in planar flows.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A planar, possibly time-varying vector field `(dx/dt, dy/dt) = (f(t,x,y), g(t,x,y))`.
///
/// Implementations may return NaN or ±infinity where the field is undefined; the
/// engine treats such values as a signal rather than an error.
pub trait VectorField<T: Scalar> {
    /// Evaluates dx/dt at (t, x, y).
    fn dxdt(&self, t: T, x: T, y: T) -> T;

    /// Evaluates dy/dt at (t, x, y).
    fn dydt(&self, t: T, x: T, y: T) -> T;

    /// Evaluates both components at once.
    fn velocity(&self, t: T, x: T, y: T) -> (T, T) {
        (self.dxdt(t, x, y), self.dydt(t, x, y))
    }

    /// True when either component is NaN or infinite at (t, x, y).
    fn is_undefined_at(&self, t: T, x: T, y: T) -> bool {
        let (u, v) = self.velocity(t, x, y);
        !u.is_finite() || !v.is_finite()
    }
}

/// Vector field assembled from two closures.
pub struct FnField<F, G> {
    dxdt: F,
    dydt: G,
}

impl<F, G> FnField<F, G> {
    pub fn new(dxdt: F, dydt: G) -> Self {
        Self { dxdt, dydt }
    }
}

impl<T, F, G> VectorField<T> for FnField<F, G>
where
    T: Scalar,
    F: Fn(T, T, T) -> T,
    G: Fn(T, T, T) -> T,
{
    fn dxdt(&self, t: T, x: T, y: T) -> T {
        (self.dxdt)(t, x, y)
    }

    fn dydt(&self, t: T, x: T, y: T) -> T {
        (self.dydt)(t, x, y)
    }
}

/// A trait for fixed-step solvers that advance a planar state by one step.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size dt from state (x, y) at time t and returns the new state.
    fn step<F: VectorField<T> + ?Sized>(&self, field: &F, t: T, x: T, y: T, dt: T) -> (T, T);
}
