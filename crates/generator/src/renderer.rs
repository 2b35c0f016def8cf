//! Tera-based page rendering against a per-run template environment.

use log::debug;
use sitepress_core::{ConfigError, PageDescriptor, RenderError, RenderedPage};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, ErrorKind, Template, Tera};
use walkdir::WalkDir;

/// File suffixes whose output is HTML/XML-escaped by default
pub const DEFAULT_AUTOESCAPE_SUFFIXES: &[&str] = &[".html", ".htm", ".xml"];

/// Template engine settings for one run.
///
/// Built once and turned into a [`PageRenderer`] with [`TemplateEnvironment::load`].
/// Nothing here is global, so two environments can coexist in one process.
#[derive(Debug, Clone)]
pub struct TemplateEnvironment {
    root: PathBuf,
    autoescape_suffixes: Vec<&'static str>,
}

impl TemplateEnvironment {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            autoescape_suffixes: DEFAULT_AUTOESCAPE_SUFFIXES.to_vec(),
        }
    }

    /// Replace the suffixes that turn on escaping. Matching ignores case. An
    /// empty list is ignored and the defaults are kept.
    pub fn with_autoescape(mut self, suffixes: Vec<&'static str>) -> Self {
        if !suffixes.is_empty() {
            self.autoescape_suffixes = suffixes;
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn autoescape_suffixes(&self) -> &[&'static str] {
        &self.autoescape_suffixes
    }

    /// Parse every template under the root and return a ready renderer.
    ///
    /// Templates are named by their root-relative path with `/` separators,
    /// which is also how `extends` and `include` refer to them. Hidden files
    /// and directories are skipped.
    ///
    /// A file that cannot be read or parsed does not fail the load. Its error
    /// is kept under its name and reported only when a page renders it or
    /// reaches it through `extends`, `import` or `include`.
    pub fn load(&self) -> sitepress_core::Result<PageRenderer> {
        if !self.root.is_dir() {
            return Err(ConfigError::TemplatesDirMissing(self.root.clone()).into());
        }

        let mut sources = BTreeMap::new();
        for (path, name) in self.template_files()? {
            debug!("Registering template {}", name);
            let source = TemplateSource::read(&path, &name);
            sources.insert(name, source);
        }
        let broken = unusable_templates(&sources);

        let usable = sources.iter().filter_map(|(name, source)| match source {
            TemplateSource::Parsed { text, .. } if !broken.contains_key(name) => {
                Some((name.as_str(), text.as_str()))
            }
            _ => None,
        });

        let mut tera = Tera::default();
        tera.add_raw_templates(usable).map_err(|e| RenderError::Load {
            root: self.root.clone(),
            message: error_chain(&e),
        })?;

        debug!(
            "Loaded {} templates from {} ({} unusable)",
            tera.get_template_names().count(),
            self.root.display(),
            broken.len()
        );

        // Tera picks escaping by a case-sensitive suffix match on the page
        // template, so keep one instance that always escapes and one that
        // never does, and choose per page.
        let mut escaping = tera.clone();
        escaping.autoescape_on(vec![""]);
        let mut verbatim = tera;
        verbatim.autoescape_on(Vec::new());

        Ok(PageRenderer {
            root: self.root.clone(),
            autoescape_suffixes: self
                .autoescape_suffixes
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            escaping,
            verbatim,
            broken,
        })
    }

    fn template_files(&self) -> Result<Vec<(PathBuf, String)>, RenderError> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

        for entry in walker {
            let entry = entry.map_err(|e| RenderError::Load {
                root: self.root.clone(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            files.push((entry.path().to_path_buf(), name));
        }

        Ok(files)
    }
}

/// One file under the templates root, parsed on its own
#[derive(Debug)]
enum TemplateSource {
    Parsed {
        text: String,
        parent: Option<String>,
        imports: Vec<String>,
    },
    Broken(String),
}

impl TemplateSource {
    fn read(path: &Path, name: &str) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => return TemplateSource::Broken(format!("failed to read '{name}': {e}")),
        };

        match Template::new(name, None, &text) {
            Ok(template) => TemplateSource::Parsed {
                parent: template.parent,
                imports: template
                    .imported_macro_files
                    .into_iter()
                    .map(|(file, _)| file)
                    .collect(),
                text,
            },
            Err(e) => TemplateSource::Broken(format!(
                "failed to parse '{name}': {}",
                error_chain(&e)
            )),
        }
    }
}

/// Templates that cannot be registered, with the reason for each.
///
/// Besides files that failed to read or parse, this covers templates whose
/// `extends` chain loops, and templates whose parent or macro file is missing
/// or itself unusable. Tera refuses to build a template set containing any of
/// these.
fn unusable_templates(sources: &BTreeMap<String, TemplateSource>) -> BTreeMap<String, String> {
    let mut broken = BTreeMap::new();

    for (name, source) in sources {
        match source {
            TemplateSource::Broken(reason) => {
                broken.insert(name.clone(), reason.clone());
            }
            TemplateSource::Parsed { .. } if extends_cycle(sources, name) => {
                broken.insert(name.clone(), format!("'{name}' has a circular extends chain"));
            }
            TemplateSource::Parsed { .. } => {}
        }
    }

    loop {
        let mut newly_broken = Vec::new();

        for (name, source) in sources {
            let TemplateSource::Parsed {
                parent, imports, ..
            } = source
            else {
                continue;
            };
            if broken.contains_key(name) {
                continue;
            }

            for dependency in parent.iter().chain(imports) {
                let reason = match broken.get(dependency) {
                    Some(reason) => reason.clone(),
                    None if !sources.contains_key(dependency) => {
                        format!("template '{dependency}' not found")
                    }
                    None => continue,
                };
                newly_broken.push((name.clone(), format!("'{name}' needs {reason}")));
                break;
            }
        }

        if newly_broken.is_empty() {
            return broken;
        }
        broken.extend(newly_broken);
    }
}

fn extends_cycle(sources: &BTreeMap<String, TemplateSource>, start: &str) -> bool {
    let mut seen = BTreeSet::new();
    let mut current = start;

    while let Some(TemplateSource::Parsed {
        parent: Some(parent),
        ..
    }) = sources.get(current)
    {
        if !seen.insert(current) {
            return true;
        }
        current = parent.as_str();
    }

    false
}

/// Renders page descriptors with a loaded template set
#[derive(Debug)]
pub struct PageRenderer {
    root: PathBuf,
    autoescape_suffixes: Vec<String>,
    escaping: Tera,
    verbatim: Tera,
    broken: BTreeMap<String, String>,
}

impl PageRenderer {
    /// Names of all usable templates, sorted
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.escaping.get_template_names().collect();
        names.sort_unstable();
        names
    }

    /// Names of templates that failed to load, sorted
    pub fn unusable_template_names(&self) -> Vec<&str> {
        self.broken.keys().map(String::as_str).collect()
    }

    /// Whether output of `template` is escaped, decided by its suffix
    /// regardless of case
    pub fn escapes(&self, template: &str) -> bool {
        let name = template.to_lowercase();
        self.autoescape_suffixes
            .iter()
            .any(|suffix| name.ends_with(suffix.as_str()))
    }

    /// Render one page. The result is addressed under `output_dir` at
    /// `<url>/index.html`.
    pub fn render(
        &self,
        descriptor: &PageDescriptor,
        output_dir: &Path,
    ) -> Result<RenderedPage, RenderError> {
        let template = &descriptor.template;

        if let Some(reason) = self.broken.get(template) {
            return Err(RenderError::Render {
                template: template.clone(),
                message: reason.clone(),
            });
        }
        if !self
            .escaping
            .get_template_names()
            .any(|name| name == template.as_str())
        {
            return Err(RenderError::NotFound {
                template: template.clone(),
                root: self.root.clone(),
            });
        }

        let context =
            Context::from_serialize(&descriptor.context).map_err(|e| RenderError::Render {
                template: template.clone(),
                message: error_chain(&e),
            })?;

        let tera = if self.escapes(template) {
            &self.escaping
        } else {
            &self.verbatim
        };
        let content = tera
            .render(template, &context)
            .map_err(|e| RenderError::Render {
                template: template.clone(),
                message: self.describe(&e),
            })?;

        Ok(RenderedPage {
            template: template.clone(),
            output_path: descriptor.output_path(output_dir),
            content,
        })
    }

    /// Engine error as one line, plus the recorded load failure of any
    /// unusable template an `include` tried to reach
    fn describe(&self, err: &tera::Error) -> String {
        let mut message = error_chain(err);
        for name in missing_templates(err) {
            if let Some(reason) = self.broken.get(&name) {
                message.push_str(" (");
                message.push_str(reason);
                message.push(')');
            }
        }
        message
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Names from every "template not found" error in the chain. Tera reports a
/// failed include as `[a, b]`.
fn missing_templates(err: &tera::Error) -> Vec<String> {
    let mut names = Vec::new();
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);

    while let Some(cause) = current {
        if let Some(e) = cause.downcast_ref::<tera::Error>()
            && let ErrorKind::TemplateNotFound(list) = &e.kind
        {
            names.extend(
                list.trim_start_matches('[')
                    .trim_end_matches(']')
                    .split(", ")
                    .map(str::to_string),
            );
        }
        current = cause.source();
    }

    names
}

/// Tera keeps the useful part of a failure (the missing variable, the bad
/// token) in its source chain, so flatten the whole chain into one line.
/// Parse errors carry a multi-line caret diagram; whitespace is collapsed.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}
