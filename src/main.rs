use migen::{
    cli::{Cli, Commands},
    commands::{
        execute_generate, execute_plan, execute_snapshot, print_generate_summary,
        print_plan_summary, print_snapshot_summary,
    },
    config::MigenConfig,
    error::{format_error_chain, suggest_fix, Result},
    logging,
    output::{CliOutputHandler, OutputHandler},
};
use std::path::Path;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    let cli = Cli::parse_args();

    logging::init(cli.verbose).map_err(|e| color_eyre::eyre::eyre!("{e}"))?;

    info!("Starting migen v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command: {:?}", cli.command);

    if let Err(e) = run(cli).await {
        logging::output::error(format_error_chain(&e));
        if let Some(suggestion) = suggest_fix(&e) {
            logging::output::hint(suggestion);
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let output = CliOutputHandler;

    if let Commands::Init = cli.command {
        let path = MigenConfig::write_sample_config(Path::new("."))?;
        output.success(&format!(
            "Created {} - rename to migen.toml to use",
            path.display()
        ));
        return Ok(());
    }

    let config_file = MigenConfig::load_from_file()?;
    if config_file.is_some() {
        info!("Loaded configuration from migen.toml");
    }

    let requested = cli.command.requested_tables();
    let mut config = MigenConfig::merge_with_cli(config_file, cli.command.overrides());
    if config.connection_string.is_none() {
        config.connection_string = std::env::var("DATABASE_URL").ok();
    }

    match cli.command {
        Commands::Generate { .. } => {
            let result = execute_generate(&config, &requested, &output).await?;
            print_generate_summary(&result);
        }
        Commands::Plan { output_graph, .. } => {
            let plan = execute_plan(&config, &requested, output_graph).await?;
            print_plan_summary(&plan);
        }
        Commands::Snapshot { output: path, .. } => {
            let result = execute_snapshot(&config, &path).await?;
            print_snapshot_summary(&result);
        }
        Commands::Init => {}
    }

    Ok(())
}
