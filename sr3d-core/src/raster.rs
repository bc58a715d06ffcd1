/// Triangle rasterization and the per-mesh draw loop
use nalgebra::{Vector2, Vector3, Vector4};

use crate::context::RenderContext;
use crate::framebuffer::Framebuffer;
use crate::shader::{Shader, Varyings, VertexOut};

/// Triangles with a vertex this close to (or behind) the eye plane are skipped
const MIN_W: f32 = 1e-6;

/// Counters for one draw call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub triangles: usize,
    /// Behind the eye or zero-area on screen
    pub skipped: usize,
    pub fragments: usize,
}

impl std::ops::AddAssign for DrawStats {
    fn add_assign(&mut self, other: Self) {
        self.triangles += other.triangles;
        self.skipped += other.skipped;
        self.fragments += other.fragments;
    }
}

/// Calculate barycentric coordinates of `p` in the 2D triangle (v0, v1, v2).
/// Returns `None` for degenerate triangles.
pub fn barycentric(
    v0: &Vector2<f32>,
    v1: &Vector2<f32>,
    v2: &Vector2<f32>,
    p: &Vector2<f32>,
) -> Option<Vector3<f32>> {
    let denom = (v1.y - v2.y) * (v0.x - v2.x) + (v2.x - v1.x) * (v0.y - v2.y);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.y - v2.y) * (p.x - v2.x) + (v2.x - v1.x) * (p.y - v2.y)) / denom;
    let w1 = ((v2.y - v0.y) * (p.x - v2.x) + (v0.x - v2.x) * (p.y - v2.y)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some(Vector3::new(w0, w1, w2))
}

/// Rasterize one triangle given its homogeneous screen coordinates.
///
/// Pixels are sampled at their centers. A fragment is shaded only when its depth
/// passes the test; it then writes depth and color unless the shader discards it.
/// Screen z grows towards the eye, so the stored depth key is `-z`.
/// Returns the number of fragments written, or `None` when the triangle was skipped.
pub fn rasterize_triangle<S: Shader + ?Sized>(
    clip: &[Vector4<f32>; 3],
    varyings: &Varyings,
    shader: &S,
    target: &mut Framebuffer,
) -> Option<usize> {
    if clip.iter().any(|c| c.w <= MIN_W) {
        return None;
    }
    let screen = clip.map(|c| c.xyz() / c.w);
    let [v0, v1, v2] = screen.map(|s| s.xy());

    // Rejects zero-area triangles up front
    barycentric(&v0, &v1, &v2, &v0)?;

    if target.width() == 0 || target.height() == 0 {
        return Some(0);
    }

    // Bounding box, clipped to the framebuffer
    let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as i64;
    let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i64).min(target.width() as i64 - 1);
    let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as i64;
    let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i64).min(target.height() as i64 - 1);

    let mut written = 0;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = Vector2::new(x as f32 + 0.5, y as f32 + 0.5);
            let Some(bar) = barycentric(&v0, &v1, &v2, &p) else {
                continue;
            };
            if bar.x < 0.0 || bar.y < 0.0 || bar.z < 0.0 {
                continue;
            }

            let z = bar.x * screen[0].z + bar.y * screen[1].z + bar.z * screen[2].z;
            let key = -z;
            let (px, py) = (x as usize, y as usize);
            if !target.is_nearer(px, py, key) {
                continue;
            }

            if let Some(color) = shader.fragment(varyings, &bar) {
                target.depth_test(px, py, key);
                target.blend_pixel(px, py, color);
                written += 1;
            }
        }
    }
    Some(written)
}

/// Draw every face of `shader`'s geometry: three vertex-stage calls in corner
/// order, then rasterization.
pub fn draw<S: Shader + ?Sized>(
    ctx: &RenderContext,
    shader: &S,
    target: &mut Framebuffer,
) -> DrawStats {
    let mut stats = DrawStats::default();
    for face in 0..shader.face_count() {
        let corners: [VertexOut; 3] = [0, 1, 2].map(|corner| shader.vertex(ctx, face, corner));
        let clip = corners.map(|c| c.clip);
        let varyings = Varyings(corners.map(|c| c.varying));

        stats.triangles += 1;
        match rasterize_triangle(&clip, &varyings, shader, target) {
            Some(fragments) => stats.fragments += fragments,
            None => {
                log::trace!("skipped face {}", face);
                stats.skipped += 1;
            }
        }
    }
    log::debug!(
        "drew {} triangles ({} skipped), {} fragments",
        stats.triangles,
        stats.skipped,
        stats.fragments
    );
    stats
}
