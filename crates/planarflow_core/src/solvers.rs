use crate::error::{EngineError, Result};
use crate::traits::{Scalar, Steppable, VectorField};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Forward Euler
pub struct Euler;

impl<T: Scalar> Steppable<T> for Euler {
    fn step<F: VectorField<T> + ?Sized>(&self, field: &F, t: T, x: T, y: T, dt: T) -> (T, T) {
        let (u, v) = field.velocity(t, x, y);
        (x + dt * u, y + dt * v)
    }
}

/// Explicit trapezoid (Heun) 2nd Order Solver
pub struct Rk2;

impl<T: Scalar> Steppable<T> for Rk2 {
    fn step<F: VectorField<T> + ?Sized>(&self, field: &F, t: T, x: T, y: T, dt: T) -> (T, T) {
        let two = T::one() + T::one();

        // k1 = dt * f(t, s)
        let (u1, v1) = field.velocity(t, x, y);
        let (k1x, k1y) = (dt * u1, dt * v1);

        // k2 = dt * f(t + dt, s + k1)
        let (u2, v2) = field.velocity(t + dt, x + k1x, y + k1y);
        let (k2x, k2y) = (dt * u2, dt * v2);

        (x + (k1x + k2x) / two, y + (k1y + k2y) / two)
    }
}

/// Classic Runge-Kutta 4th Order Solver
pub struct Rk4;

impl<T: Scalar> Steppable<T> for Rk4 {
    fn step<F: VectorField<T> + ?Sized>(&self, field: &F, t: T, x: T, y: T, dt: T) -> (T, T) {
        let two = T::one() + T::one();
        let six = two + two + two;
        let half_dt = dt / two;

        // k1 = dt * f(t, s)
        let (u, v) = field.velocity(t, x, y);
        let (k1x, k1y) = (dt * u, dt * v);

        // k2 = dt * f(t + dt/2, s + k1/2)
        let (u, v) = field.velocity(t + half_dt, x + k1x / two, y + k1y / two);
        let (k2x, k2y) = (dt * u, dt * v);

        // k3 = dt * f(t + dt/2, s + k2/2)
        let (u, v) = field.velocity(t + half_dt, x + k2x / two, y + k2y / two);
        let (k3x, k3y) = (dt * u, dt * v);

        // k4 = dt * f(t + dt, s + k3)
        let (u, v) = field.velocity(t + dt, x + k3x, y + k3y);
        let (k4x, k4y) = (dt * u, dt * v);

        // s_next = s + (k1 + 2k2 + 2k3 + k4) / 6
        (
            x + (k1x + two * k2x + two * k3x + k4x) / six,
            y + (k1y + two * k2y + two * k3y + k4y) / six,
        )
    }
}

/// Time/state series produced by a fixed-step integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationResult {
    pub t: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl IntegrationResult {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Final (t, x, y) sample.
    pub fn last(&self) -> Option<(f64, f64, f64)> {
        let k = self.t.len().checked_sub(1)?;
        Some((self.t[k], self.x[k], self.y[k]))
    }
}

/// Number of steps needed so the last sample reaches `tmax`.
///
/// Ratios within 1e-9 (relative) of an integer are snapped to it, so
/// `tmax = 2π, dt = π/100` gives exactly 200 steps. Non-finite or
/// non-positive ratios give zero steps.
pub fn step_count(tmax: f64, dt: f64) -> usize {
    let ratio = tmax / dt;
    if !ratio.is_finite() || ratio <= 0.0 {
        return 0;
    }
    let nearest = ratio.round();
    let steps = if (ratio - nearest).abs() <= 1e-9 * nearest.max(1.0) {
        nearest
    } else {
        ratio.ceil()
    };
    steps as usize
}

/// Runs `stepper` from (x0, y0) at t = 0 until t >= tmax.
///
/// NaN or infinite field values are carried through the remaining steps.
pub fn integrate_with<S: Steppable<f64>>(
    stepper: &S,
    field: &dyn VectorField<f64>,
    x0: f64,
    y0: f64,
    tmax: f64,
    dt: f64,
) -> IntegrationResult {
    let samples = step_count(tmax, dt) + 1;
    let mut t = Vec::with_capacity(samples);
    let mut x = Vec::with_capacity(samples);
    let mut y = Vec::with_capacity(samples);

    t.push(0.0);
    x.push(x0);
    y.push(y0);

    let (mut xk, mut yk) = (x0, y0);
    for k in 0..samples - 1 {
        let tk = k as f64 * dt;
        let (xn, yn) = stepper.step(field, tk, xk, yk, dt);
        xk = xn;
        yk = yn;
        t.push((k + 1) as f64 * dt);
        x.push(xk);
        y.push(yk);
    }

    IntegrationResult { t, x, y }
}

/// Shared signature of every registered integrator.
pub type Integrator = fn(&dyn VectorField<f64>, f64, f64, f64, f64) -> IntegrationResult;

pub fn euler(field: &dyn VectorField<f64>, x0: f64, y0: f64, tmax: f64, dt: f64) -> IntegrationResult {
    integrate_with(&Euler, field, x0, y0, tmax, dt)
}

pub fn rk2(field: &dyn VectorField<f64>, x0: f64, y0: f64, tmax: f64, dt: f64) -> IntegrationResult {
    integrate_with(&Rk2, field, x0, y0, tmax, dt)
}

pub fn rk4(field: &dyn VectorField<f64>, x0: f64, y0: f64, tmax: f64, dt: f64) -> IntegrationResult {
    integrate_with(&Rk4, field, x0, y0, tmax, dt)
}

/// Built-in integration methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "Euler")]
    Euler,
    #[serde(rename = "RK2")]
    Rk2,
    #[serde(rename = "RK4")]
    Rk4,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::Euler, Method::Rk2, Method::Rk4];

    pub fn name(self) -> &'static str {
        match self {
            Method::Euler => "Euler",
            Method::Rk2 => "RK2",
            Method::Rk4 => "RK4",
        }
    }

    pub fn integrator(self) -> Integrator {
        match self {
            Method::Euler => euler,
            Method::Rk2 => rk2,
            Method::Rk4 => rk4,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| EngineError::UnknownMethod(s.to_string()))
    }
}

/// Name-to-integrator lookup table. Registration order is preserved.
#[derive(Clone)]
pub struct IntegratorRegistry {
    entries: Vec<(String, Integrator)>,
}

impl Default for IntegratorRegistry {
    fn default() -> Self {
        Self {
            entries: Method::ALL
                .into_iter()
                .map(|m| (m.name().to_string(), m.integrator()))
                .collect(),
        }
    }
}

impl IntegratorRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds an integrator, replacing any existing entry with the same name.
    pub fn register(&mut self, name: impl Into<String>, integrator: Integrator) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = integrator;
        } else {
            self.entries.push((name, integrator));
        }
    }

    pub fn get(&self, name: &str) -> Result<Integrator> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, integrator)| *integrator)
            .ok_or_else(|| EngineError::UnknownMethod(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }
}

impl fmt::Debug for IntegratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegratorRegistry")
            .field("names", &self.names())
            .finish()
    }
}
