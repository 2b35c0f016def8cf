use log::{Level, log};
use sitepress_core::{PublishError, RenderedPage, STATIC_DIR_NAME};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Writes rendered pages and static assets into a fresh output directory
#[derive(Debug)]
pub struct Publisher {
    output_dir: PathBuf,
    level: Level,
}

impl Publisher {
    /// Create the output directory and all of its ancestors.
    ///
    /// Fails if anything already exists at `output_dir`; output is never
    /// merged into a previous run.
    pub fn create(output_dir: impl Into<PathBuf>) -> Result<Self, PublishError> {
        let output_dir = output_dir.into();

        if fs::symlink_metadata(&output_dir).is_ok() {
            return Err(PublishError::OutputExists(output_dir));
        }
        fs::create_dir_all(&output_dir).map_err(|e| PublishError::io(&output_dir, e))?;

        Ok(Self {
            output_dir,
            level: Level::Debug,
        })
    }

    /// Report each write at info level instead of debug
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.level = if verbose { Level::Info } else { Level::Debug };
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write one page, creating missing parent directories.
    ///
    /// An existing file at the same path is replaced, so when two entries
    /// share a URL the later one wins.
    pub fn publish(&self, page: &RenderedPage) -> Result<(), PublishError> {
        if let Some(parent) = page.output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| PublishError::io(parent, e))?;
        }
        fs::write(&page.output_path, page.content.as_bytes())
            .map_err(|e| PublishError::io(&page.output_path, e))?;

        log!(
            self.level,
            "{} -> {}",
            page.template,
            page.output_path.display()
        );
        Ok(())
    }

    /// Copy `input_dir/static` into the output root, returning the number of
    /// files copied.
    ///
    /// Runs after all pages, so a static file at the same path as a rendered
    /// page replaces it. A missing `static` directory copies nothing.
    pub fn publish_static_assets(&self, input_dir: &Path) -> Result<usize, PublishError> {
        let static_dir = input_dir.join(STATIC_DIR_NAME);

        if !static_dir.exists() {
            return Ok(0);
        }
        if !static_dir.is_dir() {
            return Err(PublishError::StaticNotDirectory(static_dir));
        }

        let mut copied = 0;
        for entry in WalkDir::new(&static_dir)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(static_dir.as_path()).to_path_buf();
                PublishError::io(path, e.into())
            })?;

            let relative = entry.path().strip_prefix(&static_dir).map_err(|_| {
                PublishError::io(
                    entry.path(),
                    std::io::Error::other("path is outside the static directory"),
                )
            })?;
            let dest = self.output_dir.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest).map_err(|e| PublishError::io(&dest, e))?;
            } else {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent).map_err(|e| PublishError::io(parent, e))?;
                }
                fs::copy(entry.path(), &dest).map_err(|e| PublishError::io(&dest, e))?;
                copied += 1;
            }
        }

        log!(
            self.level,
            "{} -> {} ({} files)",
            static_dir.display(),
            self.output_dir.display(),
            copied
        );
        Ok(copied)
    }
}
