//! Compression tasks derived from bundle targets.
//!
//! Every target with a dest becomes a task that minifies that file in place. The minifier itself
//! is an external command from the `[compress]` section.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::app::targets::targets;
use crate::domain::errors::ConfigError;
use crate::infra::config::{BundleConfig, CompressConfig, Config};

/// One in-place compression of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressTask {
    #[serde(skip)]
    pub name: String,
    pub src: PathBuf,
    pub dest: PathBuf,
}

/// Derive a task for every target with a dest. Targets without one are skipped with a warning.
pub fn derive_tasks(config: &BundleConfig) -> Vec<CompressTask> {
    targets(config)
        .filter_map(|target| match target.dest {
            Some(dest) => Some(CompressTask {
                name: target.name,
                src: dest.clone(),
                dest,
            }),
            None => {
                tracing::warn!(
                    bundle = %target.name,
                    "cannot add compress task: target has no dest"
                );
                None
            }
        })
        .collect()
}

/// Tasks to wire up for this run.
///
/// Empty unless `add_compress_targets` is set or compression was requested explicitly. Wiring
/// without a `[compress]` section is a configuration error; compilation is unaffected by it.
pub fn plan(config: &Config, requested: bool) -> Result<Vec<CompressTask>, ConfigError> {
    if !requested && !config.add_compress_targets() {
        return Ok(Vec::new());
    }
    if config.compress.is_none() {
        return Err(ConfigError::MissingCompressSection);
    }
    Ok(derive_tasks(&config.bundle))
}

/// Configuration fragment keyed by target name: `{ "<name>": { "src": .., "dest": .. } }`.
pub fn fragment(tasks: &[CompressTask]) -> Result<Value> {
    let mut map = Map::new();
    for task in tasks {
        let value = serde_json::to_value(task)
            .with_context(|| format!("failed to serialize compress task '{}'", task.name))?;
        map.insert(task.name.clone(), value);
    }
    Ok(Value::Object(map))
}

/// Runs the configured minifier command for each task.
#[derive(Debug, Clone)]
pub struct Compressor {
    command: Vec<String>,
    working_dir: PathBuf,
}

impl Compressor {
    pub fn new(
        config: &CompressConfig,
        working_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if config.command.is_empty() {
            return Err(ConfigError::EmptyCompressCommand);
        }
        Ok(Self {
            command: config.command.clone(),
            working_dir: working_dir.into(),
        })
    }

    /// Command line for `task` with `{src}` and `{dest}` substituted.
    pub fn command_for(&self, task: &CompressTask) -> Vec<String> {
        let src = path_arg(&task.src);
        let dest = path_arg(&task.dest);
        self.command
            .iter()
            .map(|arg| arg.replace("{src}", &src).replace("{dest}", &dest))
            .collect()
    }

    pub fn run(&self, task: &CompressTask) -> Result<()> {
        let command = self.command_for(task);
        let (program, args) = command
            .split_first()
            .context("compress command missing program")?;

        tracing::info!(bundle = %task.name, program = %program, "compressing bundle");
        let status = Command::new(program)
            .args(args)
            .current_dir(&self.working_dir)
            .status()
            .with_context(|| format!("failed to spawn compress command: {program}"))?;
        if status.success() {
            Ok(())
        } else {
            Err(anyhow!(
                "compress command for target '{}' exited with status {status}",
                task.name
            ))
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
