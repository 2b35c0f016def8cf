mod commands;

use clap::Parser;
use sitepress_core::DEFAULT_OUTPUT_DIR;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Tag prefixed to every diagnostic line
const TOOL_TAG: &str = "generate";

#[derive(Parser)]
#[command(name = "generate")]
#[command(version, about = "Build a static HTML site from templates and a JSON config", long_about = None)]
struct Cli {
    /// Input directory containing config.json, templates/ and optionally static/
    input_dir: PathBuf,

    /// Output directory for the generated site (must not exist)
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Print a line for every page written and for the static copy
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}: {}", TOOL_TAG, record.args()))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match commands::generate::run(cli.input_dir, cli.output, cli.verbose) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: error: {:#}", TOOL_TAG, e);
            ExitCode::FAILURE
        }
    }
}
