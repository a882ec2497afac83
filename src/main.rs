use clap::Parser;
use mobile_locator::cli::commands::{cmd_check, cmd_locate, cmd_run, cmd_simulate};
use mobile_locator::cli::config::{Cli, Commands, load_config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    mobile_locator::logging::init(cli.verbose);
    let config = load_config(cli.config.as_deref());

    let ok = match cli.command {
        Commands::Run {
            spec,
            format,
            output,
        } => cmd_run(
            &spec,
            format.as_deref(),
            output.as_deref(),
            cli.server.as_deref(),
            &config,
        )?,
        Commands::Simulate {
            spec,
            screen,
            format,
            output,
        } => cmd_simulate(&spec, &screen, format.as_deref(), output.as_deref(), &config)?,
        Commands::Check { spec } => {
            cmd_check(&spec)?;
            true
        }
        Commands::Locate {
            target,
            max_scrolls,
        } => cmd_locate(&target, max_scrolls, cli.server.as_deref(), &config)?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
