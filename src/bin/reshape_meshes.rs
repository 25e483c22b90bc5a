//! Copies ShapeNet OBJ meshes into the category layout of the ACRONYM grasps.

use clap::Parser;
use grasp_synth::dataset::{MeshReshaper, expand_home};

#[derive(Parser, Debug)]
#[command(name = "reshape-meshes")]
#[command(about = "Sort ShapeNet meshes into <category>/<identifier>.obj to match grasp annotations", long_about = None)]
struct Args {
    /// Directory with the `<category>_<identifier>_<scale>.h5` annotation files
    #[arg(long, value_name = "DIR", default_value = "~/datasets/acronym/grasps")]
    grasps: String,

    /// Flat directory of `<identifier>.obj` source meshes
    #[arg(long, value_name = "DIR", default_value = "~/datasets/models-OBJ/models/")]
    objs: String,

    /// Destination root, one subdirectory per category is created below it
    #[arg(long, value_name = "DIR", default_value = "~/datasets/acronym/meshes")]
    meshes: String,
}

fn main() -> anyhow::Result<()> {
    if let Err(e) =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init()
    {
        eprintln!("Warning: Could not initialize logger: {}", e);
    }
    let args = Args::parse();

    let reshaper = MeshReshaper::new(
        expand_home(&args.grasps),
        expand_home(&args.objs),
        expand_home(&args.meshes),
    );
    let report = reshaper.run()?;
    log::info!(
        "Copied {} meshes into {}, {} identifiers had no OBJ file",
        report.copied.len(),
        reshaper.mesh_dir.display(),
        report.missing.len()
    );
    Ok(())
}
