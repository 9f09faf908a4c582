use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

const DEMO_CONFIG: &str = "demos/basic/amdbundle.toml";

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Bundle the demo project under demos/basic
    Demo {
        /// Only build these targets
        targets: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Demo { targets } => run_demo(&targets)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn run_demo(targets: &[String]) -> Result<()> {
    let status = Command::new("cargo")
        .args(["run", "-p", "amdbundle", "--", "-v", "--config", DEMO_CONFIG, "build"])
        .args(targets)
        .status()?;
    if !status.success() {
        anyhow::bail!("demo build failed");
    }
    Ok(())
}
