//! foamstl - export OBJ scenes as ASCII STL for OpenFOAM
//!
//! Usage: foamstl scene.obj -o constant/triSurface/body.stl --forward -Z --up Y

use anyhow::Result;
use clap::Parser;
use foamstl_cli::{run, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "foamstl_core=debug,foamstl_cli=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let summary = run(&cli)?;
    println!(
        "Wrote {} solids ({} facets) to {}",
        summary.solids,
        summary.facets,
        summary.path.display()
    );
    Ok(())
}
