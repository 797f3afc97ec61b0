//! WASM bridge for the planarflow trajectory engine.
//!
//! The browser supplies the vector field as JS functions and receives paths,
//! markers, direction indicators and graph overlays as plain JS values.

mod field;
mod portrait;

pub use field::{js_equation, JsField};
pub use portrait::WasmPhasePortrait;
