//! Boundary to whatever draws the flattened buffers
//!
//! The crate never touches a GPU itself. A [`Renderer`] receives the three
//! flat buffers and draws them as one triangle strip.

pub mod js;

pub use js::JsRenderer;

use crate::error::RenderError;
use crate::mesh::FlatMesh;

/// Draws flat vertex/color/element buffers as a triangle strip.
///
/// `vertices` holds 3 floats per vertex, `colors` 4 floats per vertex, and
/// repeated consecutive `elements` mark degenerate joins.
pub trait Renderer {
    fn draw_strip(&mut self, vertices: &[f32], colors: &[f32], elements: &[u32]) -> Result<(), RenderError>;
}

/// Check the buffers agree with each other, then hand them to `renderer`
pub fn render_mesh<R: Renderer + ?Sized>(renderer: &mut R, mesh: &FlatMesh) -> Result<(), RenderError> {
    let vertices = mesh.vertex_count();
    if mesh.colors.len() != vertices {
        return Err(RenderError::AttributeMismatch {
            vertices,
            colors: mesh.colors.len(),
        });
    }
    if let Some(&index) = mesh.elements.iter().find(|&&e| e as usize >= vertices) {
        return Err(RenderError::ElementOutOfRange { index, vertices });
    }

    renderer.draw_strip(&mesh.vertex_data(), &mesh.color_data(), mesh.element_data())
}
