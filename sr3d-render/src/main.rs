/// SR3D Renderer - render a mesh to an image file
///
/// Usage: sr3d-render [MESH] [--output FILE] [--preview]
///
/// The mesh defaults to obj/african_head.obj; a sibling <name>_diffuse.tga is
/// used as its texture when present.

use anyhow::Result;
use clap::Parser;
use sr3d_render::logging::{init_logging, LoggingConfig};
use sr3d_render::{print_preview, Cli, RenderApp};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig::with_filter(cli.log.clone()));

    let app = RenderApp::from_cli(&cli)?;
    let image = app.run(&cli.output)?;

    if cli.preview {
        print_preview(&image)?;
    }

    Ok(())
}
