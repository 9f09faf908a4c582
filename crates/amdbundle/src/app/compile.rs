//! Bundle compilation: concatenate sources and name anonymous definition calls.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::app::detect::{CallSpan, Detection, detect_definition_call};
use crate::app::expand;
use crate::app::normalize::normalize;
use crate::domain::errors::CompileError;
use crate::domain::model::{
    BundleStats, BundleTarget, CompileResult, FileOutcome, IdentifierCollision, ModuleIdentifier,
    SourceFile, SourcePath,
};
use crate::infra::config::{CompileOptions, Config};
use crate::infra::fs;

/// Accumulates the output buffer of a single target.
#[derive(Debug)]
pub struct Bundler<'a> {
    options: &'a CompileOptions,
    buffer: String,
    stats: BundleStats,
    seen: HashMap<ModuleIdentifier, String>,
    collisions: Vec<IdentifierCollision>,
}

impl<'a> Bundler<'a> {
    pub fn new(options: &'a CompileOptions) -> Self {
        Self {
            options,
            buffer: String::new(),
            stats: BundleStats::default(),
            seen: HashMap::new(),
            collisions: Vec::new(),
        }
    }

    /// Append one file, rewriting its definition call when it has an anonymous one.
    pub fn push(&mut self, file: &SourceFile) -> Result<FileOutcome, CompileError> {
        self.stats.files += 1;

        if self.options.concatenate_only {
            self.append_unchanged(&file.content);
            return Ok(FileOutcome::Concatenated);
        }

        match detect_definition_call(&file.content, &self.options.definition_token) {
            Detection::NotAModule(reason) => {
                tracing::debug!(file = %file.path.display, ?reason, "not a module");
                self.append_unchanged(&file.content);
                Ok(FileOutcome::Concatenated)
            }
            Detection::Named { .. } => {
                tracing::debug!(file = %file.path.display, "module already named");
                self.append_unchanged(&file.content);
                Ok(FileOutcome::AlreadyNamed)
            }
            Detection::Anonymous(span) => {
                let id = normalize(&file.path.display, self.options.root()).map_err(|source| {
                    CompileError::Identifier {
                        file: file.path.absolute.clone(),
                        source,
                    }
                })?;
                self.record_identifier(&id, &file.path.display);
                self.append_rewritten(&file.content, span, &id);
                self.stats.modules += 1;
                tracing::debug!(file = %file.path.display, module = %id, "module rewritten");
                Ok(FileOutcome::Rewritten(id))
            }
        }
    }

    pub fn stats(&self) -> BundleStats {
        self.stats
    }

    /// Identifiers claimed by more than one file so far, in push order.
    pub fn collisions(&self) -> &[IdentifierCollision] {
        &self.collisions
    }

    pub fn finish(self) -> (String, BundleStats) {
        (self.buffer, self.stats)
    }

    fn append_unchanged(&mut self, content: &str) {
        self.buffer.push_str(content);
        self.buffer.push('\n');
    }

    fn append_rewritten(&mut self, content: &str, span: CallSpan, id: &ModuleIdentifier) {
        self.buffer.push_str(&content[..span.after_token]);
        self.buffer.push('\'');
        self.buffer.push_str(id.as_str());
        self.buffer.push_str("', ");
        self.buffer.push_str(&content[span.after_token..span.body_start]);
        self.buffer.push('\n');
        if let Some(name) = &self.options.var_name {
            self.buffer.push_str(&format!("    var {name} = '{id}';"));
        }
        self.buffer.push_str(&content[span.body_start..]);
        self.buffer.push_str("\n\n");
    }

    fn record_identifier(&mut self, id: &ModuleIdentifier, file: &str) {
        match self.seen.get(id) {
            Some(first) => {
                tracing::warn!(
                    module = %id,
                    first = %first,
                    duplicate = %file,
                    "module identifier collision"
                );
                self.collisions.push(IdentifierCollision {
                    module: id.clone(),
                    first: first.clone(),
                    duplicate: file.to_owned(),
                });
            }
            None => {
                self.seen.insert(id.clone(), file.to_owned());
            }
        }
    }
}

/// Bundle already-expanded inputs and write the result to `output`.
pub fn compile_sources(
    target: &str,
    inputs: &[SourcePath],
    options: &CompileOptions,
    output: &Path,
) -> Result<CompileResult> {
    let mut bundler = Bundler::new(options);
    for input in inputs {
        let file = fs::read_source(input)?;
        bundler
            .push(&file)
            .with_context(|| format!("failed to compile target '{target}'"))?;
    }

    let (content, stats) = bundler.finish();
    fs::write_bundle(output, &content)?;
    tracing::info!(
        bundle = target,
        files = stats.files,
        modules = stats.modules,
        output = %output.display(),
        "bundle written"
    );

    Ok(CompileResult {
        target: target.to_owned(),
        output_path: output.to_path_buf(),
        content,
        stats,
    })
}

/// Expand a target's inputs, bundle them, and write its dest file.
pub fn compile_target(config: &Config, target: &BundleTarget) -> Result<CompileResult> {
    let dest = target
        .dest
        .as_deref()
        .ok_or_else(|| CompileError::MissingDestination(target.name.clone()))?;
    let options = CompileOptions::resolve(&config.bundle.options, &target.overrides);
    let inputs = expand::expand(&config.base_dir, &target.patterns)
        .with_context(|| format!("failed to expand inputs of target '{}'", target.name))?;
    compile_sources(&target.name, &inputs, &options, &config.resolve_path(dest))
}

/// Compile targets one after another. Targets without a dest are skipped with a warning.
pub fn compile_targets(config: &Config, targets: &[BundleTarget]) -> Result<Vec<CompileResult>> {
    let mut results = Vec::with_capacity(targets.len());
    for target in targets {
        if target.dest.is_none() {
            tracing::warn!(bundle = %target.name, "skipping target without dest");
            continue;
        }
        results.push(compile_target(config, target)?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(display: &str, content: &str) -> SourceFile {
        SourceFile::new(
            SourcePath {
                display: display.to_owned(),
                absolute: display.into(),
            },
            content,
        )
    }

    fn options(root: &str) -> CompileOptions {
        CompileOptions {
            root: root.to_owned(),
            ..CompileOptions::default()
        }
    }

    #[test]
    fn rewrites_anonymous_definition() {
        let options = options("root/");
        let mut bundler = Bundler::new(&options);
        let outcome = bundler
            .push(&source(
                "root/pkg/Mod.js",
                "define(['dep'], function (dep) {\n    return dep;\n});",
            ))
            .unwrap();

        assert_eq!(outcome, FileOutcome::Rewritten(ModuleIdentifier::new("pkg/Mod")));
        let (output, stats) = bundler.finish();
        assert_eq!(
            output,
            "define('pkg/Mod', ['dep'], function (dep) {\n\n    return dep;\n});\n\n"
        );
        assert_eq!(stats, BundleStats { files: 1, modules: 1 });
    }

    #[test]
    fn injects_variable_as_first_body_statement() {
        let options = CompileOptions {
            var_name: Some("__FILE".into()),
            ..options("root/")
        };
        let mut bundler = Bundler::new(&options);
        bundler
            .push(&source(
                "root/pkg/Mod.js",
                "define([], function () {\n    start();\n});",
            ))
            .unwrap();

        let (output, _) = bundler.finish();
        assert_eq!(
            output,
            "define('pkg/Mod', [], function () {\n    var __FILE = 'pkg/Mod';\n    start();\n});\n\n"
        );
    }

    #[test]
    fn concatenate_only_skips_detection() {
        let options = CompileOptions {
            concatenate_only: true,
            ..options("root/")
        };
        let mut bundler = Bundler::new(&options);
        bundler
            .push(&source("lib/a.js", "define([], function () {});"))
            .unwrap();
        bundler.push(&source("lib/b.js", "var b = 2;")).unwrap();

        let (output, stats) = bundler.finish();
        assert_eq!(output, "define([], function () {});\nvar b = 2;\n");
        assert_eq!(stats, BundleStats { files: 2, modules: 0 });
    }

    #[test]
    fn non_modules_pass_through() {
        let options = options("root/");
        let mut bundler = Bundler::new(&options);
        let plain = bundler.push(&source("root/plain.js", "var x = 1;")).unwrap();
        let disordered = bundler
            .push(&source("root/odd.js", "define(function () { return []; });"))
            .unwrap();

        assert_eq!(plain, FileOutcome::Concatenated);
        assert_eq!(disordered, FileOutcome::Concatenated);
        let (output, stats) = bundler.finish();
        assert_eq!(output, "var x = 1;\ndefine(function () { return []; });\n");
        assert_eq!(stats.modules, 0);
    }

    #[test]
    fn rerunning_on_rewritten_output_is_a_no_op() {
        let options = options("root/");
        let mut first = Bundler::new(&options);
        first
            .push(&source("root/pkg/Mod.js", "define([], function () {\n});"))
            .unwrap();
        let (bundled, _) = first.finish();

        let mut second = Bundler::new(&options);
        let outcome = second.push(&source("root/pkg/Mod.js", &bundled)).unwrap();
        assert_eq!(outcome, FileOutcome::AlreadyNamed);
        let (rebundled, stats) = second.finish();
        assert_eq!(rebundled, format!("{bundled}\n"));
        assert_eq!(stats.modules, 0);
    }

    #[test]
    fn missing_root_in_module_path_is_an_error() {
        let options = options("amd/");
        let mut bundler = Bundler::new(&options);
        let err = bundler
            .push(&source("lib/Mod.js", "define([], function () {});"))
            .unwrap_err();
        assert!(matches!(err, CompileError::Identifier { .. }));
    }

    #[test]
    fn missing_root_in_plain_file_is_fine() {
        let options = options("amd/");
        let mut bundler = Bundler::new(&options);
        let outcome = bundler.push(&source("lib/plain.js", "var x;")).unwrap();
        assert_eq!(outcome, FileOutcome::Concatenated);
    }

    #[test]
    fn colliding_identifiers_are_still_bundled() {
        let options = options("root/");
        let mut bundler = Bundler::new(&options);
        bundler
            .push(&source("root/a/Mod.js", "define([], function () {});"))
            .unwrap();
        bundler
            .push(&source("root/a/Mod.ts", "define([], function () {});"))
            .unwrap();
        bundler
            .push(&source("root/b/Other.js", "define([], function () {});"))
            .unwrap();

        assert_eq!(bundler.stats().modules, 3);
        assert_eq!(
            bundler.collisions(),
            &[IdentifierCollision {
                module: ModuleIdentifier::new("a/Mod"),
                first: "root/a/Mod.js".into(),
                duplicate: "root/a/Mod.ts".into(),
            }]
        );
    }

    #[test]
    fn compile_sources_writes_output() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let module = temp.path().join("Mod.js");
        std::fs::write(&module, "define([], function () {\n});")?;
        let inputs = vec![SourcePath {
            display: "amd/Mod.js".into(),
            absolute: module,
        }];
        let output = temp.path().join("out/bundle.js");

        let result = compile_sources("app", &inputs, &options("amd/"), &output)?;

        assert_eq!(result.stats, BundleStats { files: 1, modules: 1 });
        assert_eq!(std::fs::read_to_string(&output)?, result.content);
        assert!(result.content.starts_with("define('Mod', [], function () {"));
        Ok(())
    }
}
