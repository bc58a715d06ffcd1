/// SR3D Core Library - software rendering pipeline
///
/// This library turns triangle meshes into raster images on the CPU: camera and
/// transform derivation, a two-stage shader contract, barycentric rasterization
/// with depth testing, and the mesh/texture/image plumbing around them.

pub mod context;
pub mod error;
pub mod framebuffer;
pub mod geometry;
pub mod obj;
pub mod projection;
pub mod raster;
pub mod scene;
pub mod shader;
pub mod stl;
pub mod texture;
pub mod transform;

// Re-export commonly used types
pub use context::RenderContext;
pub use error::{Error, Result};
pub use framebuffer::{Color, Framebuffer};
pub use geometry::{Aabb, Geometry, Mesh, UnitCube, Vertex};
pub use projection::{Camera, Lens, Viewport};
pub use raster::{draw, DrawStats};
pub use scene::{render_scene, SceneConfig};
pub use shader::{phong_intensity, PhongShader, Shader, Surface, Varying, Varyings, VertexOut};
pub use texture::{ChannelOrder, Texture};
pub use transform::Transform;
