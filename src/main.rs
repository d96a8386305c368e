use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use extract_clusters::{run, Cli};

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();
    simple_logger::init_with_level(args.get_level())?;
    info!("Starting extract-clusters with args: {}", args);

    // Get a writer to stdout or a file, then extract every cluster window.
    let mut writer: BufWriter<Box<dyn Write>> = match args.get_output() {
        Some(path) => BufWriter::new(Box::new(
            File::create(&path).with_context(|| format!("cannot create {}", path.display()))?,
        )),
        None => BufWriter::new(Box::new(io::stdout().lock())),
    };

    run(&args.config(), &mut writer)?;
    Ok(())
}
