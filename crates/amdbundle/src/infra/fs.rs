//! UTF-8 file IO for sources and bundles.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::model::{SourceFile, SourcePath};

/// Read a source file as UTF-8 text.
pub fn read_source(path: &SourcePath) -> Result<SourceFile> {
    let content = fs::read_to_string(&path.absolute)
        .with_context(|| format!("failed to read source file {}", path.absolute.display()))?;
    Ok(SourceFile::new(path.clone(), content))
}

/// Write a bundle in one go, replacing any previous file and creating parent directories.
pub fn write_bundle(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create bundle directory: {}", parent.display())
        })?;
    }
    fs::write(path, content)
        .with_context(|| format!("failed to write bundle to {}", path.display()))
}
