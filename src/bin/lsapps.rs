use std::{fs::File, io::{BufWriter, Write}, path::PathBuf, process::ExitCode};

use clap::Parser;
use appspack::{open_archive, Entry, Error};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Lists the index of an application image
struct Cli {
    archive: PathBuf,
    /// Extracts every payload to DIR/<n>.bin
    #[arg(short = 'x', long, value_name = "DIR")]
    extract: Option<PathBuf>,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let Cli { archive, extract, verbose } = Cli::parse();
    appspack::log::init(verbose);

    match lsapps_main(archive, extract) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("could not read archive: {}", e.report());

            ExitCode::FAILURE
        }
    }
}

fn lsapps_main(archive: PathBuf, extract: Option<PathBuf>) -> appspack::Result<()> {
    let mut reader = open_archive(&archive)?;

    println!("{} entries", reader.len());
    for (i, &Entry { offset, size }) in reader.index().entries.iter().enumerate() {
        println!("{i:4} 0x{offset:08x} {size}");
    }

    let Some(dir) = extract else { return Ok(()) };
    for i in 0..reader.len() {
        let path = dir.join(format!("{i}.bin"));
        let io_err = |source: std::io::Error| Error::Io { path: path.clone(), source };

        let mut out = BufWriter::new(File::create(&path).map_err(io_err)?);
        let n = reader.copy_entry(i, &mut out)?;
        out.flush().map_err(io_err)?;
        tracing::debug!("extracted {n} bytes to {}", path.display());
    }

    Ok(())
}
