/// Command-line interface
use std::path::PathBuf;

use clap::Parser;
use sr3d_core::SceneConfig;

pub const DEFAULT_MESH: &str = "obj/african_head.obj";
pub const DEFAULT_OUTPUT: &str = "output.tga";

#[derive(Parser, Debug, Clone)]
#[command(name = "sr3d-render")]
#[command(about = "Render a mesh to an image with the SR3D software rasterizer")]
pub struct Cli {
    /// Mesh to render (.obj or .stl)
    #[arg(default_value = DEFAULT_MESH)]
    pub mesh: PathBuf,

    /// Output image; the format follows the extension
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    #[arg(long, default_value_t = 800)]
    pub width: usize,

    #[arg(long, default_value_t = 800)]
    pub height: usize,

    /// Use the whole image instead of the centered three-quarter region
    #[arg(long)]
    pub full_viewport: bool,

    /// Skip the translucent box drawn around the mesh
    #[arg(long)]
    pub no_box: bool,

    /// Print an ANSI preview of the result to the terminal
    #[arg(long)]
    pub preview: bool,

    /// Log filter, e.g. "debug" or "sr3d_core=trace" (defaults to RUST_LOG, then info)
    #[arg(long)]
    pub log: Option<String>,
}

impl Cli {
    pub fn scene_config(&self) -> SceneConfig {
        SceneConfig {
            width: self.width,
            height: self.height,
            inset_viewport: !self.full_viewport,
            bounding_cube: !self.no_box,
            ..SceneConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["sr3d-render"]).unwrap();
        assert_eq!(cli.mesh, PathBuf::from(DEFAULT_MESH));
        assert_eq!(cli.output, PathBuf::from(DEFAULT_OUTPUT));
        assert!(!cli.preview);

        let config = cli.scene_config();
        assert_eq!((config.width, config.height), (800, 800));
        assert!(config.inset_viewport);
        assert!(config.bounding_cube);
    }

    #[test]
    fn test_positional_mesh_and_flags() {
        let cli = Cli::try_parse_from([
            "sr3d-render",
            "models/teapot.stl",
            "--output",
            "teapot.png",
            "--width",
            "320",
            "--full-viewport",
            "--no-box",
        ])
        .unwrap();
        assert_eq!(cli.mesh, PathBuf::from("models/teapot.stl"));
        assert_eq!(cli.output, PathBuf::from("teapot.png"));

        let config = cli.scene_config();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 800);
        assert!(!config.inset_viewport);
        assert!(!config.bounding_cube);
    }

    #[test]
    fn test_rejects_extra_positional() {
        assert!(Cli::try_parse_from(["sr3d-render", "a.obj", "b.obj"]).is_err());
    }
}
