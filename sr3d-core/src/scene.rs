/// Frame composition: the loaded mesh plus a translucent box around it
use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};
use crate::framebuffer::{Color, Framebuffer};
use crate::geometry::{Geometry, Mesh, UnitCube};
use crate::projection::{Camera, Lens, Viewport};
use crate::raster::{draw, DrawStats};
use crate::shader::PhongShader;
use crate::transform::Transform;

/// Everything that parameterizes a rendered frame
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub width: usize,
    pub height: usize,
    pub eye: Point3<f32>,
    pub center: Point3<f32>,
    pub up: Vector3<f32>,
    /// Direction towards the light, need not be normalized but must be nonzero
    pub light: Vector3<f32>,
    /// Draw into the centered three-quarter region instead of the whole image
    pub inset_viewport: bool,
    /// Draw the translucent box enclosing the mesh
    pub bounding_cube: bool,
    pub cube_margin: f32,
    pub cube_tint: Color,
    pub cube_alpha: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            eye: Point3::new(0.0, 0.0, 3.0),
            center: Point3::origin(),
            up: Vector3::y(),
            light: Vector3::new(1.0, 1.0, 1.0),
            inset_viewport: true,
            bounding_cube: true,
            cube_margin: 1.2,
            cube_tint: Color::rgb(100, 150, 255),
            cube_alpha: 0.3,
        }
    }
}

impl SceneConfig {
    pub fn camera(&self) -> Result<Camera> {
        let lens = Lens {
            aspect: self.width as f32 / self.height.max(1) as f32,
            ..Lens::default()
        };
        Camera::new(
            self.eye,
            self.center,
            self.up,
            lens,
            Viewport::full(self.width, self.height),
        )
    }

    fn viewport(&self) -> Viewport {
        if self.inset_viewport {
            Viewport::inset(self.width, self.height)
        } else {
            Viewport::full(self.width, self.height)
        }
    }
}

/// Render `mesh` and its enclosing box into a new framebuffer, flipped so row 0
/// is the top of the image.
pub fn render_scene(mesh: &Mesh, config: &SceneConfig) -> Result<Framebuffer> {
    let camera = config.camera()?;
    if config.light.try_normalize(f32::EPSILON).is_none() {
        return Err(Error::DegenerateLight);
    }
    let mut ctx = camera.apply();
    ctx.set_viewport(&config.viewport());

    let mut target = Framebuffer::new(config.width, config.height);
    let mut stats = DrawStats::default();

    let mesh_shader = PhongShader::textured(&camera, config.light, mesh);
    stats += draw(&ctx, &mesh_shader, &mut target);

    if config.bounding_cube {
        if let Some(bounds) = mesh.bounding_box() {
            let cube = UnitCube;
            let cube_shader = PhongShader::procedural(
                &camera,
                config.light,
                &cube,
                config.cube_tint,
                config.cube_alpha,
            );
            let model = Transform::enclosing(&bounds, config.cube_margin);
            stats += ctx.with_model(&model, |ctx| draw(ctx, &cube_shader, &mut target));
        }
    }

    log::info!(
        "rendered {} triangles ({} skipped) into {}x{}, {} pixels covered",
        stats.triangles,
        stats.skipped,
        config.width,
        config.height,
        target.covered_pixels()
    );

    target.flip_vertically();
    Ok(target)
}
