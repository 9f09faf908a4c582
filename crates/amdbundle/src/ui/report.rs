//! Operator-facing summaries.

use std::io::{self, Write};

use crate::domain::model::{BundleTarget, CompileResult};
use crate::infra::config::{CompileOptions, Config};

/// One summary line per compiled target.
pub fn compiled(out: &mut impl Write, results: &[CompileResult]) -> io::Result<()> {
    for result in results {
        writeln!(
            out,
            "{}: {} modules compiled. ({} files -> {})",
            result.target,
            result.stats.modules,
            result.stats.files,
            result.output_path.display()
        )?;
    }
    Ok(())
}

/// List targets with their dest and effective mode.
pub fn targets(
    out: &mut impl Write,
    config: &Config,
    targets: &[BundleTarget],
) -> io::Result<()> {
    let width = targets
        .iter()
        .map(|target| target.name.len())
        .max()
        .unwrap_or(0);
    for target in targets {
        let options = CompileOptions::resolve(&config.bundle.options, &target.overrides);
        let mode = if options.concatenate_only {
            "concatenate"
        } else {
            "modules"
        };
        let dest = target
            .dest
            .as_ref()
            .map(|dest| dest.display().to_string())
            .unwrap_or_else(|| "(no dest)".to_owned());
        writeln!(out, "{:<width$}  {mode:<11}  {dest}", target.name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app::targets::targets as declared_targets;
    use crate::domain::model::BundleStats;

    #[test]
    fn compiled_prints_one_line_per_target() {
        let results = vec![CompileResult {
            target: "common".into(),
            output_path: "www/js/common.js".into(),
            content: String::new(),
            stats: BundleStats { files: 3, modules: 2 },
        }];
        let mut out = Vec::new();
        compiled(&mut out, &results).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "common: 2 modules compiled. (3 files -> www/js/common.js)\n"
        );
    }

    #[test]
    fn targets_show_mode_and_dest() {
        let config = Config::from_str(
            r#"
[bundle.libs]
files = ["lib/a.js"]
dest = "www/libs.js"
[bundle.libs.options]
concatenate_only = true

[bundle.app]
src = "amd/**/*.js"
"#,
        )
        .unwrap();
        let all: Vec<_> = declared_targets(&config.bundle).collect();
        let mut out = Vec::new();
        targets(&mut out, &config, &all).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "libs  concatenate  www/libs.js\napp   modules      (no dest)\n"
        );
    }
}
