//! Expansion of initial-condition descriptions into candidate points.
//!
//! Random draws come from a seeded [`ChaCha8Rng`], so the same seed and inputs
//! always produce the same candidates.

use crate::error::{EngineError, Result};
use crate::settings::{SamplingSettings, Viewport};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Values for one coordinate of the initial conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialValues {
    Single { value: f64 },
    /// `start, start + step, ...` up to and including `end`.
    Range { start: f64, end: f64, step: f64 },
    /// Uniform draws over the viewport extent of the axis. Without a count the
    /// sampler's `random_count` applies.
    Random { count: Option<usize> },
}

impl InitialValues {
    pub fn single(value: f64) -> Self {
        InitialValues::Single { value }
    }

    pub fn range(start: f64, end: f64, step: f64) -> Self {
        InitialValues::Range { start, end, step }
    }

    pub fn random(count: usize) -> Self {
        InitialValues::Random { count: Some(count) }
    }

    pub fn random_default() -> Self {
        InitialValues::Random { count: None }
    }

    pub fn is_random(&self) -> bool {
        matches!(self, InitialValues::Random { .. })
    }

    fn expand(
        &self,
        low: f64,
        high: f64,
        default_count: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<f64>> {
        match *self {
            InitialValues::Single { value } => Ok(vec![value]),
            InitialValues::Range { start, end, step } => inclusive_range(start, end, step),
            InitialValues::Random { count } => Ok((0..count.unwrap_or(default_count))
                .map(|_| rng.gen_range(low..high))
                .collect()),
        }
    }
}

/// Upper bound on the values one range may expand to.
pub const MAX_RANGE_VALUES: usize = 1_000_000;

fn inclusive_range(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    if !start.is_finite() || !end.is_finite() || !step.is_finite() {
        return Err(EngineError::InvalidRange(
            "start, end and step must be finite".to_string(),
        ));
    }
    if step == 0.0 {
        return Err(EngineError::InvalidRange("step must be non-zero".to_string()));
    }
    if (end - start) * step < 0.0 {
        return Err(EngineError::InvalidRange(format!(
            "step {step} does not move from {start} toward {end}"
        )));
    }

    let steps = ((end - start) / step + 1e-9).floor();
    if !steps.is_finite() || steps >= MAX_RANGE_VALUES as f64 {
        return Err(EngineError::InvalidRange(format!(
            "range from {start} to {end} by {step} exceeds {MAX_RANGE_VALUES} values"
        )));
    }
    let count = steps as usize + 1;
    Ok((0..count).map(|k| start + k as f64 * step).collect())
}

/// Seeded generator of initial-condition candidates.
pub struct CandidateSampler {
    rng: ChaCha8Rng,
    random_count: usize,
}

impl CandidateSampler {
    pub fn new(seed: u64) -> Self {
        Self::from_settings(&SamplingSettings {
            seed,
            ..SamplingSettings::default()
        })
    }

    pub fn from_settings(settings: &SamplingSettings) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(settings.seed),
            random_count: settings.random_count,
        }
    }

    /// Candidate (x0, y0) pairs in insertion order.
    ///
    /// When both coordinates are random, every pair is an independent draw
    /// (no grid of shared x and y values); otherwise the two expanded lists are
    /// combined as a cartesian product, x-major.
    pub fn candidates(
        &mut self,
        xs: &InitialValues,
        ys: &InitialValues,
        viewport: &Viewport,
    ) -> Result<Vec<(f64, f64)>> {
        viewport.validate()?;

        if let (InitialValues::Random { count: nx }, InitialValues::Random { count: ny }) = (xs, ys) {
            let nx = nx.unwrap_or(self.random_count);
            let ny = ny.unwrap_or(self.random_count);
            let pairs = (0..nx * ny)
                .map(|_| {
                    let x = self.rng.gen_range(viewport.xmin..viewport.xmax);
                    let y = self.rng.gen_range(viewport.ymin..viewport.ymax);
                    (x, y)
                })
                .collect();
            return Ok(pairs);
        }

        let x_values = xs.expand(viewport.xmin, viewport.xmax, self.random_count, &mut self.rng)?;
        let y_values = ys.expand(viewport.ymin, viewport.ymax, self.random_count, &mut self.rng)?;
        Ok(x_values
            .iter()
            .flat_map(|&x| y_values.iter().map(move |&y| (x, y)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_includes_end_point() {
        let values = inclusive_range(0.0, 1.0, 0.1).expect("range");
        assert_eq!(values.len(), 11);
        assert!((values[10] - 1.0).abs() < 1e-12);

        let values = inclusive_range(2.0, -2.0, -1.0).expect("range");
        assert_eq!(values, vec![2.0, 1.0, 0.0, -1.0, -2.0]);

        let values = inclusive_range(0.0, 0.95, 0.5).expect("range");
        assert_eq!(values, vec![0.0, 0.5]);
    }

    #[test]
    fn range_rejects_bad_steps() {
        assert!(inclusive_range(0.0, 1.0, 0.0).is_err());
        assert!(inclusive_range(0.0, 1.0, -0.1).is_err());
        assert!(inclusive_range(0.0, f64::NAN, 0.1).is_err());
    }

    #[test]
    fn oversized_ranges_are_rejected() {
        let err = inclusive_range(0.0, 1e30, 1e-300).expect_err("overflowing ratio");
        assert!(format!("{err}").contains("exceeds"));
        assert!(inclusive_range(-1e308, 1e308, 1.0).is_err());
        assert!(inclusive_range(0.0, 1e7, 1.0).is_err());

        let values = inclusive_range(0.0, 999_999.0, 1.0).expect("largest range");
        assert_eq!(values.len(), MAX_RANGE_VALUES);
    }

    #[test]
    fn viewport_with_overflowing_span_is_rejected() {
        let huge = Viewport {
            xmin: -1e308,
            xmax: 1e308,
            ..Viewport::default()
        };
        let result = CandidateSampler::new(1).candidates(
            &InitialValues::random(2),
            &InitialValues::single(0.0),
            &huge,
        );
        assert!(matches!(result, Err(EngineError::InvalidViewport(_))));
    }

    #[test]
    fn fixed_and_range_values_form_cartesian_product() {
        let mut sampler = CandidateSampler::new(7);
        let pairs = sampler
            .candidates(
                &InitialValues::range(-1.0, 1.0, 1.0),
                &InitialValues::single(0.5),
                &Viewport::default(),
            )
            .expect("candidates");
        assert_eq!(pairs, vec![(-1.0, 0.5), (0.0, 0.5), (1.0, 0.5)]);
    }

    #[test]
    fn random_and_fixed_axes_share_the_random_list() {
        let mut sampler = CandidateSampler::new(11);
        let viewport = Viewport::default();
        let pairs = sampler
            .candidates(
                &InitialValues::random(4),
                &InitialValues::range(0.0, 1.0, 1.0),
                &viewport,
            )
            .expect("candidates");
        assert_eq!(pairs.len(), 8);
        for chunk in pairs.chunks(2) {
            assert_eq!(chunk[0].0, chunk[1].0);
            assert!(chunk[0].0 >= viewport.xmin && chunk[0].0 < viewport.xmax);
        }
    }

    #[test]
    fn doubly_random_pairs_are_independent_and_in_view() {
        let viewport = Viewport::new(0.0, 1.0, 10.0, 20.0, 100.0, 100.0).expect("viewport");
        let mut sampler = CandidateSampler::new(3);
        let pairs = sampler
            .candidates(&InitialValues::random(10), &InitialValues::random(10), &viewport)
            .expect("candidates");
        assert_eq!(pairs.len(), 100);

        let mut xs: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        xs.dedup();
        assert_eq!(xs.len(), 100, "x values should not repeat across a grid");
        for &(x, y) in &pairs {
            assert!((0.0..1.0).contains(&x));
            assert!((10.0..20.0).contains(&y));
        }
    }

    #[test]
    fn random_without_count_uses_sampler_default() {
        let settings = SamplingSettings {
            random_count: 3,
            seed: 5,
        };
        let mut sampler = CandidateSampler::from_settings(&settings);
        let pairs = sampler
            .candidates(
                &InitialValues::random_default(),
                &InitialValues::single(0.0),
                &Viewport::default(),
            )
            .expect("candidates");
        assert_eq!(pairs.len(), 3);

        let pairs = sampler
            .candidates(
                &InitialValues::random_default(),
                &InitialValues::random_default(),
                &Viewport::default(),
            )
            .expect("candidates");
        assert_eq!(pairs.len(), 9);
    }

    #[test]
    fn missing_count_deserializes_as_default() {
        let values: InitialValues = serde_json::from_str(r#"{"kind":"random"}"#).expect("json");
        assert_eq!(values, InitialValues::random_default());
    }

    #[test]
    fn same_seed_reproduces_candidates() {
        let viewport = Viewport::default();
        let random = InitialValues::random(5);
        let a = CandidateSampler::new(42)
            .candidates(&random, &random, &viewport)
            .expect("candidates");
        let b = CandidateSampler::new(42)
            .candidates(&random, &random, &viewport)
            .expect("candidates");
        let c = CandidateSampler::new(43)
            .candidates(&random, &random, &viewport)
            .expect("candidates");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
