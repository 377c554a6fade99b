use std::fmt::Display;

use js_sys::{Float32Array, Function, Uint32Array};
use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod logging;
pub mod math;
pub mod mesh;
pub mod render;
pub mod skeleton;

pub use config::TreeConfig;
pub use error::{ConfigError, ParameterError, RenderError, StructureError, TreeError, TreeResult};
pub use mesh::{FlatMesh, MeshFlattener, MeshParams};
pub use render::{render_mesh, JsRenderer, Renderer};
pub use skeleton::{Segment, SegmentId, SegmentParameters, SegmentTree, SkeletonGenerator};

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    logging::init(log::LevelFilter::Info);
}

/// A grown tree and its flattened mesh, exposed to JavaScript
#[wasm_bindgen]
pub struct ProceduralTree {
    config: TreeConfig,
    skeleton: SegmentTree,
    mesh: FlatMesh,
}

#[wasm_bindgen]
impl ProceduralTree {
    /// Grow a tree from the default configuration
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<ProceduralTree, JsValue> {
        Self::from_config(TreeConfig::default()).map_err(to_js)
    }

    /// Grow a tree from a YAML configuration
    #[wasm_bindgen]
    pub fn from_yaml(yaml: &str) -> Result<ProceduralTree, JsValue> {
        let config = TreeConfig::from_yaml(yaml).map_err(to_js)?;
        Self::from_config(config).map_err(to_js)
    }

    /// Grow a fresh tree from the same parameters with another seed
    #[wasm_bindgen]
    pub fn regrow(&mut self, seed: u32) -> Result<(), JsValue> {
        self.rebuild(u64::from(seed)).map_err(to_js)
    }

    /// Vertex positions, 3 floats per vertex
    #[wasm_bindgen]
    pub fn vertices(&self) -> Float32Array {
        Float32Array::from(self.mesh.vertex_data().as_slice())
    }

    /// RGBA colors, 4 floats per vertex
    #[wasm_bindgen]
    pub fn colors(&self) -> Float32Array {
        Float32Array::from(self.mesh.color_data().as_slice())
    }

    /// Triangle-strip element indices
    #[wasm_bindgen]
    pub fn elements(&self) -> Uint32Array {
        Uint32Array::from(self.mesh.element_data())
    }

    #[wasm_bindgen]
    pub fn segment_count(&self) -> usize {
        self.skeleton.len()
    }

    #[wasm_bindgen]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    #[wasm_bindgen]
    pub fn element_count(&self) -> usize {
        self.mesh.element_count()
    }

    /// Current configuration as YAML
    #[wasm_bindgen]
    pub fn config_yaml(&self) -> Result<String, JsValue> {
        self.config.to_yaml().map_err(to_js)
    }

    /// Hand the buffers to `callback(vertices, colors, elements)`
    #[wasm_bindgen]
    pub fn draw(&self, callback: Function) -> Result<(), JsValue> {
        let mut renderer = JsRenderer::new(callback);
        render_mesh(&mut renderer, &self.mesh).map_err(to_js)
    }
}

impl ProceduralTree {
    pub fn from_config(config: TreeConfig) -> TreeResult<Self> {
        let (skeleton, mesh) = config.build()?;
        log::info!(
            "grew tree with seed {}: {} segments, {} vertices",
            config.seed,
            skeleton.len(),
            mesh.vertex_count()
        );
        Ok(Self {
            config,
            skeleton,
            mesh,
        })
    }

    pub fn rebuild(&mut self, seed: u64) -> TreeResult<()> {
        let config = self.config.with_seed(seed);
        let (skeleton, mesh) = config.build()?;
        log::info!("regrew tree with seed {}: {} segments", seed, skeleton.len());
        self.config = config;
        self.skeleton = skeleton;
        self.mesh = mesh;
        Ok(())
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn skeleton(&self) -> &SegmentTree {
        &self.skeleton
    }

    pub fn mesh(&self) -> &FlatMesh {
        &self.mesh
    }
}

fn to_js(error: impl Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}
