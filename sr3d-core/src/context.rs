/// Explicit transform state threaded through every draw call
use nalgebra::{Matrix4, Point3, Vector4};

use crate::projection::Viewport;
use crate::transform::Transform;

/// The matrices a draw call maps object space through:
/// `Viewport · Projection · ModelView · point`.
///
/// Model matrices are stacked on top of the camera's view with
/// [`RenderContext::with_model`] or [`RenderContext::push_model`], which always
/// restore the previous model-view exactly.
#[derive(Debug, Clone)]
pub struct RenderContext {
    model_view: Matrix4<f32>,
    projection: Matrix4<f32>,
    viewport: Matrix4<f32>,
    saved: Vec<Matrix4<f32>>,
}

impl RenderContext {
    pub fn new(
        model_view: Matrix4<f32>,
        projection: Matrix4<f32>,
        viewport: Matrix4<f32>,
    ) -> Self {
        Self {
            model_view,
            projection,
            viewport,
            saved: Vec::new(),
        }
    }

    pub fn model_view(&self) -> &Matrix4<f32> {
        &self.model_view
    }

    pub fn projection(&self) -> &Matrix4<f32> {
        &self.projection
    }

    pub fn viewport(&self) -> &Matrix4<f32> {
        &self.viewport
    }

    /// Render into a different pixel region, e.g. a sub-rectangle of the image
    pub fn set_viewport(&mut self, viewport: &Viewport) {
        self.viewport = viewport.matrix();
    }

    pub fn set_projection(&mut self, projection: Matrix4<f32>) {
        self.projection = projection;
    }

    /// The full object-to-screen transform
    pub fn transform(&self) -> Matrix4<f32> {
        self.viewport * self.projection * self.model_view
    }

    /// Homogeneous screen-space coordinates of an object-space point
    pub fn project(&self, point: &Point3<f32>) -> Vector4<f32> {
        self.transform() * point.to_homogeneous()
    }

    /// Apply `model` on top of the current model-view until the matching
    /// [`RenderContext::pop_model`]
    pub fn push_model(&mut self, model: &Matrix4<f32>) {
        self.saved.push(self.model_view);
        self.model_view = Transform::model_view(&self.model_view, model);
    }

    /// Restore the model-view saved by the last push. Returns false when nothing
    /// was pushed.
    pub fn pop_model(&mut self) -> bool {
        match self.saved.pop() {
            Some(model_view) => {
                self.model_view = model_view;
                true
            }
            None => false,
        }
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Run `draw` with `model` applied, restoring the model-view afterwards.
    ///
    /// The model-view and the stack are put back exactly as they were, even if
    /// `draw` leaves its own pushes unbalanced or pops past the scope. Entries
    /// popped from the caller's part of the stack are restored as well.
    pub fn with_model<R>(
        &mut self,
        model: &Matrix4<f32>,
        draw: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let model_view = self.model_view;
        let saved = self.saved.clone();
        self.push_model(model);
        let result = draw(self);
        self.model_view = model_view;
        self.saved = saved;
        result
    }
}
