// Render-and-publish pipeline: manifest -> templates -> output tree

pub mod publisher;
pub mod renderer;

pub use publisher::Publisher;
pub use renderer::{DEFAULT_AUTOESCAPE_SUFFIXES, PageRenderer, TemplateEnvironment};

use log::debug;
use sitepress_core::{ConfigError, GenerationReport, Result, RunConfiguration, load_manifest};

/// Generate a site as described by `config`.
///
/// Pages are rendered and written one at a time in manifest order, then the
/// `static/` tree is copied over the result. The first error aborts the run
/// and anything already written stays on disk.
pub fn generate_site(config: &RunConfiguration) -> Result<GenerationReport> {
    if !config.input_dir.is_dir() {
        return Err(ConfigError::InputDirMissing(config.input_dir.clone()).into());
    }

    let manifest = load_manifest(&config.input_dir)?;
    debug!(
        "Loaded {} page entries from {}",
        manifest.len(),
        manifest.path.display()
    );

    let renderer = TemplateEnvironment::new(config.templates_dir()).load()?;
    let publisher = Publisher::create(&config.output_dir)?.verbose(config.verbose);

    let mut report = GenerationReport::default();
    for entry in manifest.iter() {
        let descriptor = entry.descriptor()?;
        let page = renderer.render(&descriptor, publisher.output_dir())?;
        publisher.publish(&page)?;
        report.pages_written += 1;
    }

    report.static_files_copied = publisher.publish_static_assets(&config.input_dir)?;

    debug!(
        "Generated {} pages and copied {} static files into {}",
        report.pages_written,
        report.static_files_copied,
        config.output_dir.display()
    );

    Ok(report)
}
