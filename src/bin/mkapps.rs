use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use appspack::{build::{DEFAULT_OUTPUT, DEFAULT_SOURCE_DIR}, BuildOptions, DiscoveryOrder, DEFAULT_CAPACITY};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Packs every `.o` file of a directory into one fixed-size image,
/// prefixed with an index of where each file landed
struct Cli {
    /// Directory to collect object files from
    #[arg(short = 'C', long, value_name = "DIR", default_value = DEFAULT_SOURCE_DIR)]
    dir: PathBuf,
    /// Output image, its directory must already exist
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    out: PathBuf,
    /// Exact size of the image in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_CAPACITY)]
    capacity: u64,
    /// Order inputs by name instead of directory order
    #[arg(long)]
    sort: bool,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let Cli {
        dir,
        out,
        capacity,
        sort,
        verbose,
    } = Cli::parse();
    appspack::log::init(verbose);

    let options = BuildOptions {
        source_dir: dir,
        output: out,
        capacity,
        order: if sort { DiscoveryOrder::Sorted } else { DiscoveryOrder::Listing },
    };

    match options.run() {
        Ok(index) => {
            tracing::info!("wrote {} entries to {}", index.count(), options.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("could not make archive: {}", e.report());

            ExitCode::FAILURE
        }
    }
}
