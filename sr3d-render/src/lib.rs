/// Offline renderer front end: load a mesh, render it, save the image
use anyhow::{Context, Result};
use std::io::{stdout, Write};
use std::path::Path;
use std::time::Instant;
use sr3d_core::{render_scene, Framebuffer, Mesh, SceneConfig};

pub mod args;
pub mod logging;
pub mod preview;

pub use args::Cli;
pub use preview::AsciiPreview;

/// One render job
pub struct RenderApp {
    mesh: Mesh,
    config: SceneConfig,
}

impl RenderApp {
    pub fn new(mesh: Mesh, config: SceneConfig) -> Self {
        Self { mesh, config }
    }

    /// Load the mesh named on the command line
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mesh = Mesh::load(&cli.mesh)
            .with_context(|| format!("failed to load mesh {}", cli.mesh.display()))?;
        Ok(Self::new(mesh, cli.scene_config()))
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn render(&self) -> Result<Framebuffer> {
        let start = Instant::now();
        let image = render_scene(&self.mesh, &self.config).context("failed to render scene")?;
        log::info!("frame rendered in {:.1?}", start.elapsed());
        Ok(image)
    }

    /// Render and write the image to `output`
    pub fn run(&self, output: &Path) -> Result<Framebuffer> {
        let image = self.render()?;
        image
            .write_to_file(output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        Ok(image)
    }
}

/// Print `image` to stdout as colored ASCII sized to the terminal
pub fn print_preview(image: &Framebuffer) -> Result<()> {
    let preview = AsciiPreview::for_terminal(image);
    let mut stdout = stdout().lock();
    preview.draw(image, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const TRIANGLE: &str = "v -0.5 -0.5 0\nv 0.5 -0.5 0\nv 0 0.5 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";

    #[test]
    fn test_run_writes_image() {
        let dir = tempfile::tempdir().unwrap();
        let mesh_path = dir.path().join("tri.obj");
        let output = dir.path().join("out.tga");
        std::fs::write(&mesh_path, TRIANGLE).unwrap();

        let mesh_arg = mesh_path.to_str().unwrap();
        let args = ["sr3d-render", mesh_arg, "--width", "64", "--height", "64"];
        let cli = Cli::try_parse_from(args).unwrap();
        let app = RenderApp::from_cli(&cli).unwrap();
        assert_eq!(app.mesh().faces.len(), 1);

        let image = app.run(&output).unwrap();
        assert!(image.covered_pixels() > 0);
        assert!(output.exists());
    }

    #[test]
    fn test_missing_mesh_reports_path() {
        let cli = Cli::try_parse_from(["sr3d-render", "/nonexistent/model.obj"]).unwrap();
        let err = RenderApp::from_cli(&cli).err().unwrap();
        assert!(format!("{:#}", err).contains("/nonexistent/model.obj"));
    }
}
