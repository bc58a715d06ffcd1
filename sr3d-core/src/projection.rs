/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::context::RenderContext;
use crate::error::{Error, Result};

/// Depth range the viewport maps normalized z onto
pub const DEPTH_RANGE: f32 = 255.0;

/// Lens parameters. Field of view, near and far are stored for callers but the
/// simplified projection only depends on the eye-to-center distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Pixel rectangle that normalized device coordinates are mapped into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            depth: DEPTH_RANGE,
        }
    }

    /// The whole `width` x `height` image
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    /// The centered region covering three quarters of each axis
    pub fn inset(width: usize, height: usize) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self::new(w / 8.0, h / 8.0, w * 3.0 / 4.0, h * 3.0 / 4.0)
    }

    /// Maps [-1, 1]^3 onto [x, x + width] x [y, y + height] x [0, depth]
    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix4<f32> {
        let (hw, hh, hd) = (self.width / 2.0, self.height / 2.0, self.depth / 2.0);
        Matrix4::new(
            hw, 0.0, 0.0, self.x + hw,
            0.0, hh, 0.0, self.y + hh,
            0.0, 0.0, hd, hd,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::full(800, 800)
    }
}

/// Camera configuration for 3D rendering.
///
/// The view, projection and viewport matrices are derived from the parameters on
/// construction and again by every setter, so they are never stale. Setters that
/// would make the basis degenerate fail and leave the camera untouched.
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Point3<f32>,
    center: Point3<f32>,
    up: Vector3<f32>,
    lens: Lens,
    viewport: Viewport,
    basis: [Vector3<f32>; 3],
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    viewport_matrix: Matrix4<f32>,
}

impl Camera {
    pub fn new(
        eye: Point3<f32>,
        center: Point3<f32>,
        up: Vector3<f32>,
        lens: Lens,
        viewport: Viewport,
    ) -> Result<Self> {
        let basis = orthonormal_basis(&eye, &center, &up)?;
        let mut camera = Self {
            eye,
            center,
            up,
            lens,
            viewport,
            basis,
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            viewport_matrix: Matrix4::identity(),
        };
        camera.derive_matrices();
        Ok(camera)
    }

    /// Camera with the default lens and an 800x800 viewport
    pub fn look_at(eye: Point3<f32>, center: Point3<f32>, up: Vector3<f32>) -> Result<Self> {
        Self::new(eye, center, up, Lens::default(), Viewport::default())
    }

    fn derive_matrices(&mut self) {
        let [x, y, z] = self.basis;
        #[rustfmt::skip]
        let rotation = Matrix4::new(
            x.x, x.y, x.z, 0.0,
            y.x, y.y, y.z, 0.0,
            z.x, z.y, z.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        self.view = rotation * Matrix4::new_translation(&-self.eye.coords);

        // Perspective keyed to the eye-to-center distance: exact only for points
        // near that depth.
        self.projection = Matrix4::identity();
        self.projection[(3, 2)] = -1.0 / self.distance();

        self.viewport_matrix = self.viewport.matrix();
    }

    fn rebuild(&mut self, eye: Point3<f32>, center: Point3<f32>, up: Vector3<f32>) -> Result<()> {
        self.basis = orthonormal_basis(&eye, &center, &up)?;
        self.eye = eye;
        self.center = center;
        self.up = up;
        self.derive_matrices();
        Ok(())
    }

    pub fn set_eye(&mut self, eye: Point3<f32>) -> Result<()> {
        self.rebuild(eye, self.center, self.up)
    }

    pub fn set_center(&mut self, center: Point3<f32>) -> Result<()> {
        self.rebuild(self.eye, center, self.up)
    }

    pub fn set_up(&mut self, up: Vector3<f32>) -> Result<()> {
        self.rebuild(self.eye, self.center, up)
    }

    pub fn set_lens(&mut self, lens: Lens) {
        self.lens = lens;
        self.derive_matrices();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.derive_matrices();
    }

    pub fn eye(&self) -> Point3<f32> {
        self.eye
    }

    pub fn center(&self) -> Point3<f32> {
        self.center
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn lens(&self) -> &Lens {
        &self.lens
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Distance from the eye to the look-at center
    pub fn distance(&self) -> f32 {
        (self.eye - self.center).norm()
    }

    /// The camera's (right, up, backward) axes in world space
    pub fn basis(&self) -> [Vector3<f32>; 3] {
        self.basis
    }

    pub fn view_matrix(&self) -> &Matrix4<f32> {
        &self.view
    }

    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    pub fn viewport_matrix(&self) -> &Matrix4<f32> {
        &self.viewport_matrix
    }

    /// `Viewport · Projection · View`
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.viewport_matrix * self.projection * self.view
    }

    /// A fresh render context seeded with this camera's matrices
    pub fn apply(&self) -> RenderContext {
        RenderContext::new(self.view, self.projection, self.viewport_matrix)
    }

    /// Unit direction from `world_pos` towards the eye, `None` at the eye itself
    pub fn view_dir(&self, world_pos: &Point3<f32>) -> Option<Vector3<f32>> {
        (self.eye - world_pos).try_normalize(f32::EPSILON)
    }
}

fn orthonormal_basis(
    eye: &Point3<f32>,
    center: &Point3<f32>,
    up: &Vector3<f32>,
) -> Result<[Vector3<f32>; 3]> {
    let z = (eye - center)
        .try_normalize(f32::EPSILON)
        .ok_or_else(|| Error::DegenerateCamera("eye and center coincide".to_string()))?;
    let x = up
        .cross(&z)
        .try_normalize(1e-6)
        .ok_or_else(|| {
            Error::DegenerateCamera("up is parallel to the view direction".to_string())
        })?;
    let y = z.cross(&x).normalize();
    Ok([x, y, z])
}
