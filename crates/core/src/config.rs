use crate::error::ConfigError;
use crate::types::*;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Load `config.json` from an input directory
pub fn load_manifest<P: AsRef<Path>>(input_dir: P) -> Result<SiteManifest, ConfigError> {
    let path = input_dir.as_ref().join(CONFIG_FILE_NAME);

    let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::NotFound(path.clone()),
        _ => ConfigError::Read {
            path: path.clone(),
            source: e,
        },
    })?;

    load_manifest_str(&path, &content)
}

/// Decode a manifest from a string (useful for testing).
///
/// `path` is only used to label errors. Entries are not inspected here; see
/// [`ManifestEntry::descriptor`].
pub fn load_manifest_str<P: AsRef<Path>>(
    path: P,
    content: &str,
) -> Result<SiteManifest, ConfigError> {
    let path = path.as_ref();

    let value: Value = serde_json::from_str(content).map_err(|e| parse_error(path, content, &e))?;

    let Value::Array(items) = value else {
        return Err(ConfigError::NotAnArray(path.to_path_buf()));
    };

    let entries = items
        .into_iter()
        .enumerate()
        .map(|(index, raw)| ManifestEntry::new(index, raw))
        .collect();

    Ok(SiteManifest {
        path: path.to_path_buf(),
        entries,
    })
}

/// Turn a decoder error into a `ConfigError::Parse` carrying its location.
///
/// serde_json reports a 1-based line and the column of the offending byte;
/// the byte offset is recovered from those against the source text.
fn parse_error(path: &Path, content: &str, err: &serde_json::Error) -> ConfigError {
    let line = err.line();
    let column = err.column();

    let line_start: usize = content
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let byte_offset = (line_start + column.saturating_sub(1)).min(content.len());

    // Location is carried separately, drop serde_json's " at line X column Y"
    let mut message = err.to_string();
    if let Some(idx) = message.rfind(" at line ") {
        message.truncate(idx);
    }

    ConfigError::Parse {
        path: path.to_path_buf(),
        line,
        column,
        byte_offset,
        message,
    }
}
