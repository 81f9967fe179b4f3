mod data;
mod error;
mod pipeline;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use data::probe::FsProbe;
use pipeline::{default_base_dir, RunConfig};

#[derive(Parser)]
#[command(
    name = "poster-audit",
    version,
    about = "Filter a scraped poster dataset and audit which image files exist on disk"
)]
struct Cli {
    /// Input dataset (.csv, .json, or .parquet)
    input: PathBuf,

    /// Destination for the filtered dataset (format chosen by extension)
    output: PathBuf,

    /// Directory image paths are resolved against (default: the input file's directory)
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Append dropped rows to this file, one JSON object per line
    #[arg(long, value_name = "PATH")]
    rejects: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let base_dir = cli
        .base_dir
        .unwrap_or_else(|| default_base_dir(&cli.input));
    let config = RunConfig {
        input: cli.input,
        output: cli.output,
        base_dir,
        rejects: cli.rejects,
    };

    let report = pipeline::run(&config, &FsProbe)?;
    println!("{}", report.summary_line());
    Ok(())
}
