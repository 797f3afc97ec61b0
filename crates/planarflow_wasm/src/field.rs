//! JavaScript callables adapted to the engine's field traits.

use js_sys::Function;
use planarflow_core::traits::VectorField;
use std::rc::Rc;
use wasm_bindgen::JsValue;

/// Vector field whose components are JS functions `(t, x, y) -> number`.
pub struct JsField {
    dxdt: Function,
    dydt: Function,
}

impl JsField {
    pub fn new(dxdt: Function, dydt: Function) -> Self {
        Self { dxdt, dydt }
    }
}

impl VectorField<f64> for JsField {
    fn dxdt(&self, t: f64, x: f64, y: f64) -> f64 {
        as_number(self.dxdt.call3(
            &JsValue::NULL,
            &JsValue::from_f64(t),
            &JsValue::from_f64(x),
            &JsValue::from_f64(y),
        ))
    }

    fn dydt(&self, t: f64, x: f64, y: f64) -> f64 {
        as_number(self.dydt.call3(
            &JsValue::NULL,
            &JsValue::from_f64(t),
            &JsValue::from_f64(x),
            &JsValue::from_f64(y),
        ))
    }
}

/// Wraps a JS function `(x, y) -> number` as an implicit-curve equation.
pub fn js_equation(function: Function) -> Rc<dyn Fn(f64, f64) -> f64> {
    Rc::new(move |x: f64, y: f64| {
        as_number(function.call2(&JsValue::NULL, &JsValue::from_f64(x), &JsValue::from_f64(y)))
    })
}

/// Thrown exceptions and non-number results read as NaN, which the engine
/// treats as "field undefined here".
fn as_number(result: Result<JsValue, JsValue>) -> f64 {
    result.ok().and_then(|value| value.as_f64()).unwrap_or(f64::NAN)
}
