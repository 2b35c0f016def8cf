use anyhow::{Context, Result};
use log::debug;
use sitepress_core::RunConfiguration;
use sitepress_generator::generate_site;
use std::path::PathBuf;

/// Render every page in `input_dir/config.json` into `output`
pub fn run(input_dir: PathBuf, output: PathBuf, verbose: bool) -> Result<()> {
    let config = RunConfiguration {
        input_dir,
        output_dir: output,
        verbose,
    };

    debug!("Source: {}", config.input_dir.display());
    debug!("Output: {}", config.output_dir.display());

    generate_site(&config)
        .with_context(|| format!("failed to generate site from {}", config.input_dir.display()))?;

    Ok(())
}
