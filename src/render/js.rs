use js_sys::{Float32Array, Function, Uint32Array};
use wasm_bindgen::JsValue;

use super::Renderer;
use crate::error::RenderError;

/// Forwards buffers to a JavaScript callback `(vertices, colors, elements) => void`.
///
/// The callback owns the GL side: buffer upload and the `TRIANGLE_STRIP` draw.
pub struct JsRenderer {
    callback: Function,
}

impl JsRenderer {
    pub fn new(callback: Function) -> Self {
        Self { callback }
    }
}

impl Renderer for JsRenderer {
    fn draw_strip(&mut self, vertices: &[f32], colors: &[f32], elements: &[u32]) -> Result<(), RenderError> {
        let vertices = Float32Array::from(vertices);
        let colors = Float32Array::from(colors);
        let elements = Uint32Array::from(elements);

        self.callback
            .call3(&JsValue::NULL, &vertices, &colors, &elements)
            .map(|_| ())
            .map_err(|e| RenderError::Backend(describe(&e)))
    }
}

/// Best-effort text for a thrown JS value
fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}
