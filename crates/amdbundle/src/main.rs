use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = amdbundle::ui::cli::Cli::parse();
    amdbundle::init(cli.log_level());

    cli.run()
}
