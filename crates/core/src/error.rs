use std::path::PathBuf;

/// Errors raised while locating or decoding the site manifest, or while
/// extracting a page descriptor from one of its entries.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("input directory not found: {}", .0.display())]
    InputDirMissing(PathBuf),

    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "failed to parse {}: {message} (line {line}, column {column}, byte offset {byte_offset})",
        .path.display()
    )]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        byte_offset: usize,
        message: String,
    },

    #[error("{}: expected a JSON array of page entries", .0.display())]
    NotAnArray(PathBuf),

    #[error("entry {index}: missing required key '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("entry {index}: key '{field}' must be {expected}")]
    InvalidField {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("entry {index}: url '{url}' escapes the output directory")]
    UnsafeUrl { index: usize, url: String },

    #[error("templates directory not found: {}", .0.display())]
    TemplatesDirMissing(PathBuf),
}

/// Errors raised by the template engine.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to load templates from {}: {message}", .root.display())]
    Load { root: PathBuf, message: String },

    #[error("template '{template}' not found in {}", .root.display())]
    NotFound { template: String, root: PathBuf },

    #[error("failed to render template '{template}': {message}")]
    Render { template: String, message: String },
}

/// Errors raised while writing into the output tree.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("output directory already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("static path is not a directory: {}", .0.display())]
    StaticNotDirectory(PathBuf),

    #[error("filesystem error at {}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl PublishError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PublishError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

pub type Result<T> = std::result::Result<T, Error>;
