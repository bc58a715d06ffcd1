/// Programmable shading: the vertex/fragment contract and the Phong shader
use nalgebra::{Point3, Vector2, Vector3, Vector4};

use crate::context::RenderContext;
use crate::framebuffer::Color;
use crate::geometry::{Geometry, Mesh};
use crate::projection::Camera;

pub const AMBIENT: f32 = 0.1;
pub const DIFFUSE_WEIGHT: f32 = 0.8;
pub const SPECULAR_WEIGHT: f32 = 0.5;
pub const SHININESS: f32 = 32.0;

/// Per-vertex attributes handed from the vertex stage to the fragment stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Varying {
    /// Object-space position
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Default for Varying {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            normal: Vector3::zeros(),
            uv: Vector2::zeros(),
        }
    }
}

/// What the vertex stage produces for one triangle corner
#[derive(Debug, Clone, Copy)]
pub struct VertexOut {
    /// Homogeneous screen-space position, before the divide by `w`
    pub clip: Vector4<f32>,
    pub varying: Varying,
}

/// The three corner varyings of the triangle being rasterized
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Varyings(pub [Varying; 3]);

impl Varyings {
    /// Affine blend `Σ bar_i · varying_i`. Exact at the corners.
    pub fn interpolate(&self, bar: &Vector3<f32>) -> Varying {
        let [a, b, c] = &self.0;
        Varying {
            position: Point3::from(
                a.position.coords * bar.x + b.position.coords * bar.y + c.position.coords * bar.z,
            ),
            normal: a.normal * bar.x + b.normal * bar.y + c.normal * bar.z,
            uv: a.uv * bar.x + b.uv * bar.y + c.uv * bar.z,
        }
    }
}

/// Two-stage shading interface driven by the rasterizer.
///
/// `vertex` is called for corners 0, 1 and 2 of a face, in that order, before any
/// fragment of that face is shaded. `fragment` returns `None` to discard.
pub trait Shader {
    fn face_count(&self) -> usize;
    fn vertex(&self, ctx: &RenderContext, face: usize, corner: usize) -> VertexOut;
    fn fragment(&self, varyings: &Varyings, bar: &Vector3<f32>) -> Option<Color>;
}

/// Phong lighting intensity in [0, 1].
///
/// `light` must be normalized. A degenerate normal yields ambient light only and
/// a missing view direction disables the specular term.
pub fn phong_intensity(
    normal: &Vector3<f32>,
    light: &Vector3<f32>,
    view: Option<&Vector3<f32>>,
) -> f32 {
    let Some(n) = normal.try_normalize(f32::EPSILON) else {
        return AMBIENT;
    };

    let n_dot_l = n.dot(light);
    let diffuse = n_dot_l.max(0.0);
    let specular = match (view, (n * (2.0 * n_dot_l) - light).try_normalize(f32::EPSILON)) {
        (Some(v), Some(reflected)) => reflected.dot(v).max(0.0).powf(SHININESS),
        _ => 0.0,
    };

    let intensity = AMBIENT + DIFFUSE_WEIGHT * diffuse + SPECULAR_WEIGHT * specular;
    if intensity.is_nan() {
        return AMBIENT;
    }
    intensity.clamp(0.0, 1.0)
}

/// What a [`PhongShader`] draws and how it is colored
pub enum Surface<'a> {
    /// A loaded mesh colored by its diffuse map
    Textured { mesh: &'a Mesh },
    /// A procedural shape with a flat tint and constant opacity in [0, 1]
    Procedural {
        shape: &'a dyn Geometry,
        tint: Color,
        alpha: f32,
    },
}

impl Surface<'_> {
    fn geometry(&self) -> &dyn Geometry {
        match self {
            Surface::Textured { mesh } => *mesh,
            Surface::Procedural { shape, .. } => *shape,
        }
    }
}

/// Per-pixel Phong shading with a single directional light
pub struct PhongShader<'a> {
    camera: &'a Camera,
    light: Vector3<f32>,
    surface: Surface<'a>,
}

impl<'a> PhongShader<'a> {
    /// `light` points from surfaces towards the light; it is normalized here.
    /// A zero vector falls back to `+Z`; [`crate::render_scene`] rejects it
    /// before getting this far.
    pub fn new(camera: &'a Camera, light: Vector3<f32>, surface: Surface<'a>) -> Self {
        Self {
            camera,
            light: light.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::z),
            surface,
        }
    }

    pub fn textured(camera: &'a Camera, light: Vector3<f32>, mesh: &'a Mesh) -> Self {
        Self::new(camera, light, Surface::Textured { mesh })
    }

    pub fn procedural(
        camera: &'a Camera,
        light: Vector3<f32>,
        shape: &'a dyn Geometry,
        tint: Color,
        alpha: f32,
    ) -> Self {
        Self::new(camera, light, Surface::Procedural { shape, tint, alpha })
    }

    pub fn light(&self) -> &Vector3<f32> {
        &self.light
    }
}

impl Shader for PhongShader<'_> {
    fn face_count(&self) -> usize {
        self.surface.geometry().face_count()
    }

    fn vertex(&self, ctx: &RenderContext, face: usize, corner: usize) -> VertexOut {
        let geometry = self.surface.geometry();
        let position = geometry.position(face, corner);
        let normal = geometry.normal(face, corner);

        let varying = match self.surface {
            Surface::Textured { .. } => Varying {
                position,
                normal: normal.try_normalize(f32::EPSILON).unwrap_or(normal),
                uv: geometry.uv(face, corner),
            },
            Surface::Procedural { .. } => Varying {
                position,
                normal,
                uv: Vector2::zeros(),
            },
        };

        VertexOut {
            clip: ctx.project(&position),
            varying,
        }
    }

    fn fragment(&self, varyings: &Varyings, bar: &Vector3<f32>) -> Option<Color> {
        let v = varyings.interpolate(bar);
        let view = self.camera.view_dir(&v.position);
        let intensity = phong_intensity(&v.normal, &self.light, view.as_ref());

        let color = match self.surface {
            Surface::Procedural { tint, alpha, .. } => Color {
                a: (alpha.clamp(0.0, 1.0) * 255.0) as u8,
                ..tint.scaled(intensity)
            },
            Surface::Textured { mesh } => Color {
                a: 255,
                ..mesh.diffuse_sample(&v.uv).scaled(intensity)
            },
        };
        Some(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::UnitCube;
    use crate::texture::{ChannelOrder, Texture};

    fn varying(x: f32) -> Varying {
        Varying {
            position: Point3::new(x, x * 2.0, x * 3.0),
            normal: Vector3::new(0.1 * x, 0.3, -x),
            uv: Vector2::new(x / 7.0, 1.0 / (x + 3.0)),
        }
    }

    #[test]
    fn test_interpolate_exact_at_corners() {
        let varyings = Varyings([varying(0.37), varying(1.91), varying(-2.3)]);
        assert_eq!(varyings.interpolate(&Vector3::new(1.0, 0.0, 0.0)), varyings.0[0]);
        assert_eq!(varyings.interpolate(&Vector3::new(0.0, 1.0, 0.0)), varyings.0[1]);
        assert_eq!(varyings.interpolate(&Vector3::new(0.0, 0.0, 1.0)), varyings.0[2]);
    }

    #[test]
    fn test_interpolate_is_affine() {
        let varyings = Varyings([varying(0.0), varying(1.0), varying(2.0)]);
        let mid = varyings.interpolate(&Vector3::new(0.25, 0.5, 0.25));
        assert!((mid.position - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-6);
    }

    #[test]
    fn test_intensity_bounds() {
        let light = Vector3::new(1.0, 1.0, 1.0).normalize();
        let directions = [
            light,
            -light,
            Vector3::x(),
            -Vector3::y(),
            Vector3::new(0.3, -0.2, 0.9).normalize(),
            Vector3::zeros(),
        ];
        for n in &directions {
            for v in &directions {
                let view = v.try_normalize(f32::EPSILON);
                let i = phong_intensity(n, &light, view.as_ref());
                assert!((0.0..=1.0).contains(&i), "intensity {} for n={} v={}", i, n, v);
            }
        }
    }

    #[test]
    fn test_intensity_terms() {
        let light = Vector3::z();
        // Facing the light and the viewer: everything saturates
        assert_eq!(phong_intensity(&Vector3::z(), &light, Some(&Vector3::z())), 1.0);
        // Facing away from both: ambient only
        let away = phong_intensity(&-Vector3::z(), &light, Some(&-Vector3::z()));
        assert!((away - AMBIENT).abs() < 1e-6);
        // Lit from behind, the mirrored light still reaches a viewer on the far side
        assert!((phong_intensity(&-Vector3::z(), &light, Some(&Vector3::z())) - 0.6).abs() < 1e-6);
        // Degenerate normal
        assert_eq!(phong_intensity(&Vector3::zeros(), &light, None), AMBIENT);
        // Side-on with no view direction: ambient plus nothing
        assert!((phong_intensity(&Vector3::x(), &light, None) - AMBIENT).abs() < 1e-6);
    }

    #[test]
    fn test_procedural_color_and_alpha() {
        let camera =
            Camera::look_at(Point3::new(0.0, 0.0, 3.0), Point3::origin(), Vector3::y()).unwrap();
        let cube = UnitCube;
        let shader = PhongShader::procedural(
            &camera,
            Vector3::new(0.0, 0.0, -1.0),
            &cube,
            Color::rgb(100, 150, 255),
            0.3,
        );
        // Normal facing away from the light: ambient only
        let corner = Varying {
            position: Point3::new(0.0, 0.0, 0.5),
            normal: Vector3::z(),
            uv: Vector2::zeros(),
        };
        let color = shader
            .fragment(&Varyings([corner; 3]), &Vector3::new(1.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(color, Color::rgba(10, 15, 25, 76));
    }

    #[test]
    fn test_textured_reads_uv_and_reorders_channels() {
        let camera =
            Camera::look_at(Point3::new(0.0, 0.0, 3.0), Point3::origin(), Vector3::y()).unwrap();
        let mut mesh = crate::obj::parse_obj(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1\n",
        )
        .unwrap();
        mesh.diffuse = Some(Texture::from_raw(1, 1, ChannelOrder::Bgr, vec![[200, 100, 50, 255]]));
        let shader = PhongShader::textured(&camera, Vector3::z(), &mesh);

        let ctx = camera.apply();
        let corners: Vec<VertexOut> = (0..3).map(|c| shader.vertex(&ctx, 0, c)).collect();
        assert_eq!(corners[1].varying.uv, Vector2::new(1.0, 0.0));
        assert_eq!(corners[2].varying.position, Point3::new(0.0, 1.0, 0.0));

        let varyings = Varyings([corners[0].varying, corners[1].varying, corners[2].varying]);
        let color = shader.fragment(&varyings, &Vector3::new(1.0, 0.0, 0.0)).unwrap();
        // Lit head-on and viewed head-on: full intensity, RGB order restored
        assert_eq!(color, Color::rgb(50, 100, 200));
    }
}
