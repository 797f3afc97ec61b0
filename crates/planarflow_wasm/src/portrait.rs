//! Phase portrait state held on the Rust side of the bridge.

use crate::field::{js_equation, JsField};
use js_sys::Function;
use planarflow_core::graph::ImplicitCurve;
use planarflow_core::sampling::{CandidateSampler, InitialValues};
use planarflow_core::settings::{FlowSettings, RenderStyle, SamplingSettings, Viewport};
use planarflow_core::traits::VectorField;
use planarflow_core::trajectory_set::TrajectorySet;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// WASM-exported phase portrait: one vector field, its trajectories and any
/// implicit-curve overlays, all sharing one viewport.
#[wasm_bindgen]
pub struct WasmPhasePortrait {
    field: Rc<dyn VectorField<f64>>,
    trajectories: TrajectorySet,
    graphs: Vec<ImplicitCurve>,
    sampler: CandidateSampler,
}

#[wasm_bindgen]
impl WasmPhasePortrait {
    /// `viewport_val`, `style_val` and `sampling_val` may be `undefined` to use defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        dxdt: Function,
        dydt: Function,
        viewport_val: JsValue,
        style_val: JsValue,
        sampling_val: JsValue,
    ) -> Result<WasmPhasePortrait, JsValue> {
        console_error_panic_hook::set_once();

        let viewport: Viewport = payload_or_default(viewport_val, "viewport").map_err(js_error)?;
        let style: RenderStyle = payload_or_default(style_val, "render style").map_err(js_error)?;
        let sampling: SamplingSettings =
            payload_or_default(sampling_val, "sampling settings").map_err(js_error)?;

        let trajectories = TrajectorySet::new(viewport, style).map_err(js_error)?;
        Ok(WasmPhasePortrait {
            field: Rc::new(JsField::new(dxdt, dydt)),
            trajectories,
            graphs: Vec::new(),
            sampler: CandidateSampler::from_settings(&sampling),
        })
    }

    /// Replaces the vector field. Existing trajectories belong to the old
    /// field and are dropped.
    pub fn set_field(&mut self, dxdt: Function, dydt: Function) {
        self.field = Rc::new(JsField::new(dxdt, dydt));
        self.trajectories.reset();
    }

    /// Refits trajectory geometry and resamples graphs. `style_val` may be
    /// `undefined` to keep the current style.
    pub fn set_viewport(&mut self, viewport_val: JsValue, style_val: JsValue) -> Result<(), JsValue> {
        let viewport: Viewport = payload(viewport_val, "viewport").map_err(js_error)?;
        let style = if style_val.is_undefined() || style_val.is_null() {
            *self.trajectories.style()
        } else {
            payload(style_val, "render style").map_err(js_error)?
        };

        self.trajectories
            .on_viewport_change(viewport, style)
            .map_err(js_error)?;
        for graph in &mut self.graphs {
            graph.rebuild(&viewport).map_err(js_error)?;
        }
        Ok(())
    }

    /// Adds the cartesian product of `xs` and `ys`. Returns the add report.
    pub fn add_trajectories(
        &mut self,
        xs: Vec<f64>,
        ys: Vec<f64>,
        settings_val: JsValue,
    ) -> Result<JsValue, JsValue> {
        let settings: FlowSettings =
            payload_or_default(settings_val, "flow settings").map_err(js_error)?;
        let report = self
            .trajectories
            .add(&xs, &ys, &self.field, &settings)
            .map_err(js_error)?;
        serialize(&report)
    }

    /// Adds trajectories from `InitialValues` payloads, e.g.
    /// `{ kind: "range", start: -2, end: 2, step: 0.5 }` or `{ kind: "random" }`.
    pub fn add_sampled(
        &mut self,
        x_values_val: JsValue,
        y_values_val: JsValue,
        settings_val: JsValue,
    ) -> Result<JsValue, JsValue> {
        let xs: InitialValues = payload(x_values_val, "x initial values").map_err(js_error)?;
        let ys: InitialValues = payload(y_values_val, "y initial values").map_err(js_error)?;
        let settings: FlowSettings =
            payload_or_default(settings_val, "flow settings").map_err(js_error)?;

        let candidates = self
            .sampler
            .candidates(&xs, &ys, self.trajectories.viewport())
            .map_err(js_error)?;
        let report = self
            .trajectories
            .add_candidates(candidates, &self.field, &settings)
            .map_err(js_error)?;
        serialize(&report)
    }

    /// Adds the zero set of `equation(x, y)` as an overlay and returns its index.
    /// Domains are `[low, high]` pairs; `undefined` means unbounded.
    pub fn add_graph(
        &mut self,
        equation: Function,
        x_domain_val: JsValue,
        y_domain_val: JsValue,
    ) -> Result<usize, JsValue> {
        let x_domain = domain(x_domain_val, "x domain").map_err(js_error)?;
        let y_domain = domain(y_domain_val, "y domain").map_err(js_error)?;

        let mut graph = ImplicitCurve::new(js_equation(equation))
            .with_domain(x_domain, y_domain)
            .map_err(js_error)?;
        graph.rebuild(self.trajectories.viewport()).map_err(js_error)?;
        self.graphs.push(graph);
        Ok(self.graphs.len() - 1)
    }

    pub fn clear_graphs(&mut self) {
        self.graphs.clear();
    }

    pub fn paths(&self) -> Result<JsValue, JsValue> {
        serialize(&self.trajectories.paths())
    }

    pub fn markers(&self) -> Result<JsValue, JsValue> {
        serialize(&self.trajectories.markers())
    }

    pub fn directions(&self) -> Result<JsValue, JsValue> {
        serialize(&self.trajectories.directions())
    }

    /// Segments of every graph, in the order the graphs were added.
    pub fn graphs(&self) -> Result<JsValue, JsValue> {
        let segments: Vec<_> = self.graphs.iter().map(ImplicitCurve::segments).collect();
        serialize(&segments)
    }

    /// `{ t, x, y }` columns of the trajectory starting exactly at (x0, y0).
    pub fn time_series(&self, x0: f64, y0: f64) -> Result<JsValue, JsValue> {
        let series = self
            .trajectories
            .trajectory_at(x0, y0)
            .and_then(|trajectory| trajectory.time_series())
            .ok_or_else(|| JsValue::from_str(&format!("No trajectory starts at ({x0}, {y0})")))?;
        serialize(series)
    }

    pub fn marker_at(&self, x: f64, y: f64) -> Option<usize> {
        self.trajectories.marker_at(x, y)
    }

    /// Initial conditions whose arrowhead was omitted, as `[x0, y0]` pairs.
    pub fn degenerate_directions(&self) -> Result<JsValue, JsValue> {
        serialize(&self.trajectories.degenerate_directions())
    }

    pub fn advance_frame(&mut self, frame: usize) {
        self.trajectories.advance_animation_frame(frame);
    }

    pub fn frame_count(&self) -> usize {
        self.trajectories.animation_frame_count()
    }

    pub fn method_names(&self) -> Vec<String> {
        self.trajectories
            .method_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }
}

fn payload<T: DeserializeOwned>(value: JsValue, what: &str) -> anyhow::Result<T> {
    from_value(value).map_err(|e| anyhow::anyhow!("Invalid {}: {}", what, e))
}

fn payload_or_default<T: DeserializeOwned + Default>(value: JsValue, what: &str) -> anyhow::Result<T> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    payload(value, what)
}

fn domain(value: JsValue, what: &str) -> anyhow::Result<(f64, f64)> {
    if value.is_undefined() || value.is_null() {
        return Ok((f64::NEG_INFINITY, f64::INFINITY));
    }
    let bounds: Vec<f64> = payload(value, what)?;
    match bounds.as_slice() {
        [low, high] => Ok((*low, *high)),
        _ => anyhow::bail!("Invalid {}: expected [low, high], got {} values", what, bounds.len()),
    }
}

fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
