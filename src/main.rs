use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use turnout_atlas::config::{Config, ConfigOverrides};
use turnout_atlas::output::csv::summary_to_csv;
use turnout_atlas::output::json::{render_json, render_summary_json};
use turnout_atlas::output::table::render_summary_table;
use turnout_atlas::pipeline::{
    load_inputs, render_outputs, run_aggregation, run_prediction, write_outputs,
};
use turnout_atlas::summary::{summarize, RunSummary};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "turnout-atlas",
    about = "Aggregate voter-file statistics to census geographies and predict turnout"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long = "out-dir")]
    out_dir: Option<String>,
    #[arg(long)]
    folds: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Aggregate blocks and write the three observed layers.
    Aggregate,
    /// Aggregate, predict, and write all six layers.
    Predict,
    /// Aggregate and predict without writing; print the run summary.
    Summary,
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        out_dir: cli.out_dir.clone(),
        folds: cli.folds,
        seed: cli.seed,
    });

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }
    config.validate()?;

    let inputs = load_inputs(&config)?;
    let aggregated = run_aggregation(inputs)?;
    let id_field = config.boundaries.id_field.as_str();

    let summary = match &cli.command {
        Commands::Aggregate => {
            let outputs = render_outputs(&aggregated.layers, None, id_field)?;
            let written = write_outputs(&config.output_dir(), &outputs)?;
            info!(files = written.len(), "aggregation complete");
            summarize(&aggregated.layers, aggregated.block_filter, None)
        }
        Commands::Predict => {
            let predicted = run_prediction(&aggregated.layers, &config.predictor)?;
            let outputs =
                render_outputs(&aggregated.layers, Some(&predicted.layers), id_field)?;
            let written = write_outputs(&config.output_dir(), &outputs)?;
            info!(files = written.len(), "prediction complete");
            summarize(
                &predicted.layers,
                aggregated.block_filter,
                Some(predicted.report),
            )
        }
        Commands::Summary => {
            let predicted = run_prediction(&aggregated.layers, &config.predictor)?;
            summarize(
                &predicted.layers,
                aggregated.block_filter,
                Some(predicted.report),
            )
        }
        Commands::Config { .. } => return Ok(()),
    };

    print_summary(&summary, cli.output)
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &Path) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_summary_table(summary)),
        OutputFormat::Json => println!("{}", render_summary_json(summary)?),
        OutputFormat::Csv => println!("{}", summary_to_csv(summary)?),
    }
    Ok(())
}
