use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cramfs_builder::{build_image, BuildConfig, Fidelity};

/// Pack a directory tree into a Compressed ROMFS image.
#[derive(Debug, Parser)]
#[command(name = "cramfs-builder", version)]
struct Cli {
    /// Directory to pack [default: approot]
    source_dir: Option<PathBuf>,

    /// Image file to write [default: image.bin]
    output: Option<PathBuf>,

    /// TOML build config; positional paths override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Compute a CRC-32 checksum, append the name/offset table and write atomically
    #[arg(long)]
    complete: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let summary = build_image(&config).with_context(|| {
        format!(
            "building image from '{}' to '{}'",
            config.source_dir.display(),
            config.output_path.display()
        )
    })?;

    println!(
        "Image created: {} ({} bytes, {} nodes: {} directories, {} files)",
        summary.output.display(),
        summary.total_size,
        summary.node_count,
        summary.directory_count,
        summary.file_count
    );
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<BuildConfig> {
    let preset = cli.complete.then_some(Fidelity::Complete);
    let mut config = match &cli.config {
        Some(path) => BuildConfig::load_with_preset(path, preset)?,
        None => BuildConfig::default().with_fidelity(preset.unwrap_or_default()),
    };
    if let Some(source_dir) = &cli.source_dir {
        config.source_dir = source_dir.clone();
    }
    if let Some(output) = &cli.output {
        config.output_path = output.clone();
    }
    Ok(config)
}
