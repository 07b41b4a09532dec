use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use log::error;
use source_bsp::{
    bsp::{gamelump::GameLumps, BspFile},
    config::OpenOptions,
    error::Result,
};

/// Print the lump directory of a Source or Titanfall map.
#[derive(Parser, Debug)]
#[command(name = "bsp-explorer", version)]
struct Cli {
    /// Map to open
    map: PathBuf,

    /// Read the map as this branch instead of detecting it
    #[arg(short, long)]
    branch: Option<String>,

    /// INI file with a [bsp] section
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record bad lumps and keep going
    #[arg(long)]
    lenient: bool,
}

impl Cli {
    fn options(&self) -> Result<OpenOptions> {
        let mut options = match &self.config {
            Some(path) => OpenOptions::load(path)?,
            None => OpenOptions::default(),
        };
        if let Some(branch) = &self.branch {
            options = options.branch(branch);
        }
        if self.lenient {
            options = options.strict(false);
        }
        Ok(options)
    }
}

fn print_lumps(bsp: &BspFile) {
    println!(
        "{:>4}  {:<40} {:>10} {:>10} {:>4}  {:<8} {:>8}  schema",
        "id", "name", "offset", "length", "ver", "storage", "count"
    );
    for view in bsp.lumps() {
        let header = view.header();
        let (offset, version) = (header.file_ofs, header.version);
        let storage = if view.external_path().is_some() {
            "external"
        } else if view.is_compressed() {
            "lzma"
        } else {
            "embedded"
        };
        println!(
            "{:>4x}  {:<40} {:>10} {:>10} {:>4}  {:<8} {:>8}  {}",
            view.id(),
            view.name(),
            offset,
            view.len(),
            version,
            storage,
            view.count(),
            view.schema().map_or("raw", |s| s.name)
        );
    }
}

fn print_game_lumps(game_lumps: &GameLumps) -> Result<()> {
    let directory = game_lumps.directory();
    println!("\ngame lumps: {}", directory.segments().len());
    for (k, segment) in directory.segments().iter().enumerate() {
        let (version, flags, offset) = (segment.version, segment.flags, segment.file_ofs);
        println!(
            "  {}  v{version:<3} flags {flags:#06x}  offset {offset:>10}  length {:>8}",
            segment.tag(),
            directory.segment_len(k)?
        );
    }
    if let Some(props) = game_lumps.static_props()? {
        println!(
            "static props v{}: {} props, {} models, {} leaves",
            props.version,
            props.len(),
            props.names.len(),
            props.leaves.len()
        );
        if props.props.is_none() {
            println!("  (no layout for this version, {} bytes kept)", props.prop_data.len());
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let bsp = BspFile::open_with(&cli.map, &cli.options()?)?;
    println!(
        "{}: {} v{} revision {}",
        cli.map.display(),
        bsp.branch().name,
        bsp.version(),
        bsp.revision()
    );
    print_lumps(&bsp);

    if bsp.has_lump("GAME_LUMP") {
        if let Err(e) = bsp.game_lumps().and_then(|g| print_game_lumps(&g)) {
            println!("game lump: {e}");
        }
    }

    let partitions = bsp.entity_partitions();
    if !partitions.is_empty() {
        println!("\nentity partitions:");
        for partition in partitions {
            println!("  {:<8} {}", partition.name, partition.header);
        }
        match bsp.partition_model_count() {
            Some(count) => println!("model_count={count}"),
            None => println!("model_count disagrees between partitions"),
        }
    }

    if !bsp.loading_errors().is_empty() {
        println!("\nskipped:");
        for (name, e) in bsp.loading_errors() {
            println!("  {name}: {e}");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}: {e}", cli.map.display());
            ExitCode::FAILURE
        }
    }
}
