//! Domain models for bundle targets, source files, and compile results.

use std::fmt;
use std::path::PathBuf;

use crate::infra::config::OptionOverrides;

/// A named set of input patterns merged into one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleTarget {
    pub name: String,
    /// Input patterns in declaration order, resolved by [`crate::app::expand`].
    pub patterns: Vec<String>,
    pub dest: Option<PathBuf>,
    /// Target-local option overrides layered over the global options.
    pub overrides: OptionOverrides,
}

/// An input path as produced by glob expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourcePath {
    /// Slash-separated path relative to the configuration directory.
    pub display: String,
    pub absolute: PathBuf,
}

/// A resolved path plus its raw text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: SourcePath,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: SourcePath, content: impl Into<String>) -> Self {
        Self {
            path,
            content: content.into(),
        }
    }
}

/// Root-relative, extension-stripped module name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleIdentifier(String);

impl ModuleIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What happened to a single file while building a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Appended unchanged.
    Concatenated,
    /// Definition call rewritten to carry the identifier.
    Rewritten(ModuleIdentifier),
    /// Definition call already carried an identifier; appended unchanged.
    AlreadyNamed,
}

/// Two files of one bundle that normalize to the same module identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCollision {
    pub module: ModuleIdentifier,
    pub first: String,
    pub duplicate: String,
}

/// Counters reported after a target has been bundled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BundleStats {
    pub files: usize,
    pub modules: usize,
}

/// Outcome of compiling one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    pub target: String,
    pub output_path: PathBuf,
    pub content: String,
    pub stats: BundleStats,
}
