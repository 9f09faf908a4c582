//! Enumerating and selecting declared bundle targets.

use crate::domain::errors::ConfigError;
use crate::domain::model::BundleTarget;
use crate::infra::config::BundleConfig;

/// Key of the `[bundle]` entry that holds global options rather than a target.
pub const RESERVED_OPTIONS_KEY: &str = "options";

/// Every declared target in declaration order, excluding the options entry.
pub fn targets(config: &BundleConfig) -> impl Iterator<Item = BundleTarget> + '_ {
    config
        .targets
        .iter()
        .filter(|(name, _)| name.as_str() != RESERVED_OPTIONS_KEY)
        .map(|(name, target)| BundleTarget {
            name: name.clone(),
            patterns: target.patterns(),
            dest: target.dest.clone(),
            overrides: target.options.clone(),
        })
}

/// Pick the targets to run: all of them when `only` is empty, minus anything in `exclude`.
///
/// Declaration order is kept regardless of the order names are given in.
pub fn select(
    config: &BundleConfig,
    only: &[String],
    exclude: &[String],
) -> Result<Vec<BundleTarget>, ConfigError> {
    for name in only.iter().chain(exclude) {
        if name == RESERVED_OPTIONS_KEY || !config.targets.contains_key(name) {
            return Err(ConfigError::UnknownTarget(name.clone()));
        }
    }

    Ok(targets(config)
        .filter(|target| only.is_empty() || only.contains(&target.name))
        .filter(|target| !exclude.contains(&target.name))
        .collect())
}
