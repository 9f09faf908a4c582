//! Command line entry point.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::filter::LevelFilter;

use crate::app::compile::compile_targets;
use crate::app::compress::{self, CompressTask, Compressor};
use crate::app::{targets, watch};
use crate::domain::model::{BundleTarget, CompileResult};
use crate::infra::config::Config;
use crate::infra::logging;
use crate::ui::report;

#[derive(Debug, Parser)]
#[command(
    name = "amdbundle",
    author,
    version,
    about = "Bundle AMD modules into named output files",
    long_about = None
)]
pub struct Cli {
    /// Project configuration file (defaults to the nearest amdbundle.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compile bundle targets
    Build(BuildArgs),
    /// List declared targets
    Targets,
    /// Print the derived compression configuration as JSON
    CompressConfig,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Targets to compile (all when omitted)
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Targets to leave out
    #[arg(long, value_name = "TARGET")]
    pub exclude: Vec<String>,

    /// Run the configured compressor on every compiled bundle
    #[arg(long)]
    pub optimized: bool,

    /// Recompile whenever a source file changes
    #[arg(short, long)]
    pub watch: bool,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        logging::level_for(self.verbose, self.quiet)
    }

    pub fn run(self) -> Result<()> {
        let mut stdout = io::stdout().lock();

        if let Commands::Completions { shell } = self.command {
            clap_complete::generate(shell, &mut Cli::command(), "amdbundle", &mut stdout);
            return Ok(());
        }

        let config = Config::load(self.config.as_deref())?;
        match &self.command {
            Commands::Build(args) => build(&config, args, &mut stdout),
            Commands::Targets => {
                let all: Vec<_> = targets::targets(&config.bundle).collect();
                report::targets(&mut stdout, &config, &all)?;
                Ok(())
            }
            Commands::CompressConfig => {
                let tasks = compress::derive_tasks(&config.bundle);
                let fragment = compress::fragment(&tasks)?;
                let rendered = serde_json::to_string_pretty(&fragment)
                    .context("failed to render compress configuration")?;
                writeln!(stdout, "{rendered}")?;
                Ok(())
            }
            Commands::Completions { .. } => Ok(()),
        }
    }
}

fn build(config: &Config, args: &BuildArgs, out: &mut impl Write) -> Result<()> {
    let selected = targets::select(&config.bundle, &args.targets, &args.exclude)?;
    let results = build_pass(config, &selected, args.optimized, out)?;

    if args.watch {
        watch_and_rebuild(config, &selected, args.optimized, &results, out)?;
    }
    Ok(())
}

/// Compile `selected`, report, and compress the fresh outputs when `optimized`.
fn build_pass(
    config: &Config,
    selected: &[BundleTarget],
    optimized: bool,
    out: &mut impl Write,
) -> Result<Vec<CompileResult>> {
    let results = compile_targets(config, selected)?;
    report::compiled(out, &results)?;

    match compress::plan(config, optimized) {
        Ok(tasks) if optimized => compress_outputs(config, &tasks, &results)?,
        Ok(_) => {}
        Err(err) => tracing::error!("{err}; skipping compression"),
    }
    Ok(results)
}

fn compress_outputs(
    config: &Config,
    tasks: &[CompressTask],
    results: &[CompileResult],
) -> Result<()> {
    let Some(compress_config) = &config.compress else {
        return Ok(());
    };
    let compressor = Compressor::new(compress_config, config.base_dir.clone())?;
    for task in tasks
        .iter()
        .filter(|task| results.iter().any(|result| result.target == task.name))
    {
        compressor.run(task)?;
    }
    Ok(())
}

fn watch_and_rebuild(
    config: &Config,
    selected: &[BundleTarget],
    optimized: bool,
    results: &[CompileResult],
    out: &mut impl Write,
) -> Result<()> {
    let outputs: Vec<PathBuf> = results
        .iter()
        .map(|result| result.output_path.clone())
        .collect();
    watch::watch(&config.base_dir, &outputs, || {
        build_pass(config, selected, optimized, out).map(drop)
    })
}
