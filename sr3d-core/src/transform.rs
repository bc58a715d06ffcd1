/// Model transformation matrices
use nalgebra::{Matrix4, Vector3};

use crate::geometry::Aabb;

/// Transform builder for model matrices
pub struct Transform;

impl Transform {
    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Model matrix that maps the unit cube centered at the origin onto `bounds`,
    /// grown by `margin` on every axis (`1.0` fits exactly).
    pub fn enclosing(bounds: &Aabb, margin: f32) -> Matrix4<f32> {
        let center = bounds.center();
        let size = bounds.size() * margin;
        Self::translation_matrix(center.x, center.y, center.z)
            * Self::scale_matrix(size.x, size.y, size.z)
    }

    /// Combine a view and a model matrix; the model is applied first
    pub fn model_view(view: &Matrix4<f32>, model: &Matrix4<f32>) -> Matrix4<f32> {
        view * model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_enclosing_maps_cube_corners() {
        let bounds = Aabb {
            min: Point3::new(-1.0, 0.0, 2.0),
            max: Point3::new(1.0, 4.0, 3.0),
        };
        let model = Transform::enclosing(&bounds, 1.0);
        let lo = model.transform_point(&Point3::new(-0.5, -0.5, -0.5));
        let hi = model.transform_point(&Point3::new(0.5, 0.5, 0.5));
        assert!((lo - bounds.min).norm() < 1e-6);
        assert!((hi - bounds.max).norm() < 1e-6);
    }

    #[test]
    fn test_enclosing_margin_grows_about_center() {
        let bounds = Aabb {
            min: Point3::new(-1.0, -1.0, -1.0),
            max: Point3::new(1.0, 1.0, 1.0),
        };
        let model = Transform::enclosing(&bounds, 1.2);
        let hi = model.transform_point(&Point3::new(0.5, 0.5, 0.5));
        assert!((hi - Point3::new(1.2, 1.2, 1.2)).norm() < 1e-6);
    }

    #[test]
    fn test_identity_scale() {
        let matrix = Transform::scale_matrix(1.0, 1.0, 1.0);
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }
}
