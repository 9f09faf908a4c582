//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigError;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static JS_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier regex"));

pub const PROJECT_CONFIG_FILE: &str = "amdbundle.toml";
pub const DEFAULT_DEFINITION_TOKEN: &str = "define(";

/// Layered configuration loaded from defaults, user, project, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bundle: BundleConfig,
    #[serde(default)]
    pub compress: Option<CompressConfig>,
    /// Directory input patterns and dest paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// The `[bundle]` table: global options under the reserved `options` key, every other key a
/// target, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BundleConfig {
    #[serde(default)]
    pub options: OptionOverrides,
    #[serde(flatten)]
    pub targets: IndexMap<String, TargetConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TargetConfig {
    #[serde(default)]
    pub src: Option<Patterns>,
    #[serde(default)]
    pub files: Option<Patterns>,
    #[serde(default)]
    pub dest: Option<PathBuf>,
    #[serde(default)]
    pub options: OptionOverrides,
}

impl TargetConfig {
    /// Input patterns, `src` taking precedence over `files`.
    pub fn patterns(&self) -> Vec<String> {
        self.src
            .as_ref()
            .or(self.files.as_ref())
            .map(Patterns::to_vec)
            .unwrap_or_default()
    }
}

/// A single glob or an ordered list of globs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, expecting = "a glob pattern or an array of glob patterns")]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Patterns::One(pattern) => vec![pattern.clone()],
            Patterns::Many(patterns) => patterns.clone(),
        }
    }
}

/// Option values as written in a config layer. Unset fields defer to the layer below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OptionOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concatenate_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var_name: Option<String>,
    /// Only read from the global options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_compress_targets: Option<bool>,
}

/// External minifier invocation. `{src}` and `{dest}` are substituted per task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressConfig {
    pub command: Vec<String>,
}

/// Effective options for compiling one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub root: String,
    pub definition_token: String,
    pub concatenate_only: bool,
    pub var_name: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            root: String::new(),
            definition_token: DEFAULT_DEFINITION_TOKEN.to_owned(),
            concatenate_only: false,
            var_name: None,
        }
    }
}

impl CompileOptions {
    /// Resolve global options overlaid by a target's overrides.
    pub fn resolve(global: &OptionOverrides, target: &OptionOverrides) -> Self {
        let merged = merge_overrides(global.clone(), target.clone());
        let defaults = Self::default();
        Self {
            root: merged.root.unwrap_or(defaults.root),
            definition_token: merged
                .definition_token
                .unwrap_or(defaults.definition_token),
            concatenate_only: merged.concatenate_only.unwrap_or(defaults.concatenate_only),
            var_name: merged.var_name.filter(|name| !name.is_empty()),
        }
    }

    /// Root as seen by the normalizer; empty means "after the first slash".
    pub fn root(&self) -> Option<&str> {
        Some(self.root.as_str()).filter(|root| !root.is_empty())
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    root: Option<String>,
    var_name: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            root: env::var("AMDBUNDLE_ROOT").ok(),
            var_name: env::var("AMDBUNDLE_VAR_NAME").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(root: &str, var_name: &str) -> Self {
        Self {
            root: Some(root.to_owned()),
            var_name: Some(var_name.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user config, the project file, and env overrides.
    ///
    /// `explicit` replaces project file discovery; it must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let project = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => project_config_path()?,
        };
        let config = Self::load_with_layers(global, project, env)?;
        config.validate()?;
        Ok(config)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        project: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?.options_only(&global_path));
        }

        let base_dir = match &project {
            Some(project_path) => {
                layers.push(Self::from_file(project_path)?);
                project_path
                    .parent()
                    .filter(|parent| !parent.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."))
            }
            None => env::current_dir().context("unable to determine working directory")?,
        };

        let mut merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        merged.base_dir = base_dir;
        Ok(apply_env_overrides(merged, env_overrides))
    }

    /// Keep only `[bundle.options]`; targets and `[compress]` belong to a project.
    fn options_only(self, path: &Path) -> Self {
        if !self.bundle.targets.is_empty() || self.compress.is_some() {
            tracing::warn!(
                config = %path.display(),
                "user config may only set [bundle.options]; ignoring targets and [compress]"
            );
        }
        Self {
            bundle: BundleConfig {
                options: self.bundle.options,
                targets: IndexMap::new(),
            },
            ..Self::default()
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    pub fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    /// Global options resolved against the built-in defaults.
    pub fn global_options(&self) -> CompileOptions {
        CompileOptions::resolve(&self.bundle.options, &OptionOverrides::default())
    }

    pub fn add_compress_targets(&self) -> bool {
        self.bundle.options.add_compress_targets.unwrap_or(false)
    }

    /// Resolve a configured path against [`Config::base_dir`].
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_overrides(&self.bundle.options)?;
        for target in self.bundle.targets.values() {
            validate_overrides(&target.options)?;
        }
        if let Some(compress) = &self.compress
            && compress.command.is_empty()
        {
            return Err(ConfigError::EmptyCompressCommand);
        }
        Ok(())
    }

    fn merge(self, other: Self) -> Self {
        let mut targets = self.bundle.targets;
        for (name, target) in other.bundle.targets {
            targets.insert(name, target);
        }
        Self {
            bundle: BundleConfig {
                options: merge_overrides(self.bundle.options, other.bundle.options),
                targets,
            },
            compress: other.compress.or(self.compress),
            base_dir: self.base_dir,
        }
    }
}

fn validate_overrides(overrides: &OptionOverrides) -> Result<(), ConfigError> {
    if let Some(name) = overrides.var_name.as_deref()
        && !name.is_empty()
        && !JS_IDENTIFIER.is_match(name)
    {
        return Err(ConfigError::InvalidVarName(name.to_owned()));
    }
    if overrides.definition_token.as_deref() == Some("") {
        return Err(ConfigError::EmptyDefinitionToken);
    }
    Ok(())
}

fn merge_overrides(mut base: OptionOverrides, overlay: OptionOverrides) -> OptionOverrides {
    if let Some(value) = overlay.root {
        base.root = Some(value);
    }
    if let Some(value) = overlay.definition_token {
        base.definition_token = Some(value);
    }
    if let Some(value) = overlay.concatenate_only {
        base.concatenate_only = Some(value);
    }
    if let Some(value) = overlay.var_name {
        base.var_name = Some(value);
    }
    if let Some(value) = overlay.add_compress_targets {
        base.add_compress_targets = Some(value);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("amdbundle/config.toml"))
}

fn project_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    Ok(find_project_file(&cwd))
}

fn find_project_file(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(PROJECT_CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(root) = env.root {
        config.bundle.options.root = Some(root);
    }
    if let Some(var_name) = env.var_name {
        config.bundle.options.var_name = Some(var_name);
    }
    config
}
