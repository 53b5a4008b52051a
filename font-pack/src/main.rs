//! Generate font collection crates from a zip archive of fonts.
//!
//! ```text
//! fontpack [--plan FILE] [--jobs N] [--verify] INPUT_ARCHIVE OUTPUT_DIR
//! ```

use std::process::ExitCode;

use env_logger::Env;
use font_pack::{Options, Plan};
use log::info;

const USAGE: &str = "Usage: fontpack [--plan FILE] [--jobs N] [--verify] INPUT_ARCHIVE OUTPUT_DIR";

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = match flags::Fontpack::from_env() {
        Ok(args) => args,
        Err(err) if err.is_help() => {
            println!("{err}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Fatal error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &flags::Fontpack) -> Result<(), font_pack::Error> {
    let plan = match &args.plan {
        Some(path) => Plan::load(path)?,
        None => Plan::default(),
    };
    let options = Options {
        jobs: args.jobs,
        verify: args.verify,
    };
    let reports = font_pack::run(&args.input, &args.output, &plan, &options)?;
    for report in &reports {
        info!(
            "{}: {} fonts, {} bytes in {} chunks",
            report.name,
            report.fonts.len(),
            report.manifest.compressed_len,
            report.manifest.chunk_ids.len()
        );
    }
    Ok(())
}

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Package a zip archive of fonts into font collection crates.
        cmd fontpack {
            /// The zip archive of source fonts.
            required input: PathBuf
            /// The directory the crates are written to.
            required output: PathBuf
            /// A TOML file replacing the built in package catalog.
            optional -p, --plan plan: PathBuf
            /// The number of packages generated at once.
            optional -j, --jobs jobs: usize
            /// Decode every package after writing it.
            optional --verify
        }
    }
}
