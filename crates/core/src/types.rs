use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};

use crate::error::ConfigError;

/// Name of the site manifest inside the input directory
pub const CONFIG_FILE_NAME: &str = "config.json";
/// Directory holding page templates, relative to the input directory
pub const TEMPLATES_DIR_NAME: &str = "templates";
/// Optional directory copied verbatim into the output root
pub const STATIC_DIR_NAME: &str = "static";
/// Output root used when the caller does not pick one
pub const DEFAULT_OUTPUT_DIR: &str = "generated_html";
/// Document written inside every page directory
pub const INDEX_FILE_NAME: &str = "index.html";

/// Settings for a single generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfiguration {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub verbose: bool,
}

impl RunConfiguration {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            verbose: false,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.input_dir.join(CONFIG_FILE_NAME)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.input_dir.join(TEMPLATES_DIR_NAME)
    }

    pub fn static_dir(&self) -> PathBuf {
        self.input_dir.join(STATIC_DIR_NAME)
    }
}

/// Decoded `config.json`: page entries in file order
#[derive(Debug, Clone)]
pub struct SiteManifest {
    pub path: PathBuf,
    pub entries: Vec<ManifestEntry>,
}

impl SiteManifest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }
}

/// One undecoded element of the manifest array.
///
/// Entries are kept as raw JSON so that a malformed entry only fails once the
/// pipeline reaches it. Call [`ManifestEntry::descriptor`] to extract the
/// typed fields.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub index: usize,
    pub raw: Value,
}

impl ManifestEntry {
    pub fn new(index: usize, raw: Value) -> Self {
        Self { index, raw }
    }

    /// Extract `url`, `template` and `context` from this entry
    pub fn descriptor(&self) -> Result<PageDescriptor, ConfigError> {
        let object = self.raw.as_object().ok_or(ConfigError::InvalidField {
            index: self.index,
            field: "entry",
            expected: "an object",
        })?;

        let url = self.string_field(object, "url")?;
        let template = self.string_field(object, "template")?;
        let context = match object.get("context") {
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(ConfigError::InvalidField {
                    index: self.index,
                    field: "context",
                    expected: "an object",
                });
            }
            None => {
                return Err(ConfigError::MissingField {
                    index: self.index,
                    field: "context",
                });
            }
        };

        let descriptor = PageDescriptor {
            url,
            template,
            context,
        };
        validate_url(self.index, &descriptor.url)?;
        Ok(descriptor)
    }

    fn string_field(
        &self,
        object: &Map<String, Value>,
        field: &'static str,
    ) -> Result<String, ConfigError> {
        match object.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(ConfigError::InvalidField {
                index: self.index,
                field,
                expected: "a string",
            }),
            None => Err(ConfigError::MissingField {
                index: self.index,
                field,
            }),
        }
    }
}

/// A page to render: where it goes, which template, and its variables
#[derive(Debug, Clone, PartialEq)]
pub struct PageDescriptor {
    pub url: String,
    pub template: String,
    pub context: Map<String, Value>,
}

impl PageDescriptor {
    /// URL with every leading slash removed
    pub fn relative_url(&self) -> &str {
        self.url.trim_start_matches('/')
    }

    /// `<output_dir>/<url>/index.html`
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.relative_url()).join(INDEX_FILE_NAME)
    }
}

/// Rendered HTML waiting to be written
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub template: String,
    pub output_path: PathBuf,
    pub content: String,
}

/// Totals for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub pages_written: usize,
    pub static_files_copied: usize,
}

/// Reject URLs that would place a page outside the output directory.
///
/// Leading slashes are stripped before checking, so `/about` is fine while
/// `../etc` and `/a/../../b` are not.
fn validate_url(index: usize, url: &str) -> Result<(), ConfigError> {
    let path = Path::new(url.trim_start_matches('/'));

    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(ConfigError::UnsafeUrl {
            index,
            url: url.to_string(),
        });
    }

    Ok(())
}
