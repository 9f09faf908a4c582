//! Input pattern expansion.
//!
//! Patterns are applied in order. Matches of one glob are sorted by path, a file is kept at the
//! position of its first match, and a `!pattern` drops earlier matches. Unmatched patterns are
//! silently empty.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use indexmap::IndexMap;

use crate::domain::model::SourcePath;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Resolve `patterns` relative to `base_dir` into an ordered list of existing files.
pub fn expand(base_dir: &Path, patterns: &[String]) -> Result<Vec<SourcePath>> {
    let mut matched: IndexMap<String, PathBuf> = IndexMap::new();

    for raw in patterns {
        let (negated, pattern) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw.as_str()),
        };
        let pattern = pattern.trim_start_matches("./");

        if negated {
            let matcher = build_matcher(pattern)?;
            matched.retain(|display, _| !matcher.is_match(display));
            continue;
        }

        let found = if is_glob(pattern) {
            walk_glob(base_dir, pattern)?
        } else {
            literal_file(base_dir, pattern)
        };
        if found.is_empty() {
            tracing::debug!(pattern = %raw, "pattern matched no files");
        }
        for (display, absolute) in found {
            matched.entry(display).or_insert(absolute);
        }
    }

    Ok(matched
        .into_iter()
        .map(|(display, absolute)| SourcePath { display, absolute })
        .collect())
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

fn build_matcher(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern '{pattern}'"))?;
    Ok(glob.compile_matcher())
}

fn literal_file(base_dir: &Path, pattern: &str) -> Vec<(String, PathBuf)> {
    let absolute = base_dir.join(pattern);
    if absolute.is_file() {
        vec![(to_display_path(Path::new(pattern)), absolute)]
    } else {
        Vec::new()
    }
}

fn walk_glob(base_dir: &Path, pattern: &str) -> Result<Vec<(String, PathBuf)>> {
    let matcher = build_matcher(pattern)?;
    let absolute = Path::new(pattern).is_absolute();
    let walk_root = base_dir.join(literal_prefix(pattern));
    if !walk_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut builder = WalkBuilder::new(&walk_root);
    builder.standard_filters(false).hidden(true);

    let mut found = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "expansion error");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|kind| kind.is_file()) {
            continue;
        }
        let rel = if absolute {
            entry.path()
        } else {
            entry.path().strip_prefix(base_dir).unwrap_or(entry.path())
        };
        let display = to_display_path(rel);
        if matcher.is_match(&display) {
            found.push((display, entry.path().to_path_buf()));
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

/// Leading directories of `pattern` that contain no glob syntax.
fn literal_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    if pattern.starts_with('/') {
        prefix.push("/");
    }
    let mut segments = pattern.split('/').filter(|segment| !segment.is_empty()).peekable();
    while let Some(segment) = segments.next() {
        // The last segment names files, never a directory to walk.
        if segments.peek().is_none() || segment.contains(GLOB_META) {
            break;
        }
        prefix.push(segment);
    }
    prefix
}

/// Slash-separated form of `path`. Leading `/` and `..` segments are kept so the display
/// still matches the pattern that found it.
fn to_display_path(path: &Path) -> String {
    let mut display = String::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => display.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => display.push('/'),
            Component::CurDir => {}
            Component::ParentDir => push_segment(&mut display, ".."),
            Component::Normal(part) => push_segment(&mut display, &part.to_string_lossy()),
        }
    }
    display
}

fn push_segment(display: &mut String, segment: &str) {
    if !display.is_empty() && !display.ends_with('/') {
        display.push('/');
    }
    display.push_str(segment);
}
