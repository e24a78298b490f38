use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use harmony_e2e::config::RunConfig;
use harmony_e2e::dates;
use harmony_e2e::fixtures::{schedule, students};

/// End-to-end workflows for the Harmony Hub school-management app.
#[derive(Parser)]
#[command(name = "harmony-e2e")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Run configuration file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenario suites against the application in a real browser
    Run {
        /// Only scenarios whose id or suite contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Override the application base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Override the number of parallel workers
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Print the fixture tables
    Fixtures {
        /// Output format
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: Format,

        /// Which table to print
        #[arg(short, long, value_enum, default_value = "all")]
        table: Table,
    },
    /// Print the date and time values assertions compare against
    Today,
    /// List the scenarios of every suite
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Table {
    All,
    Schedule,
    Students,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn,harmony_e2e=info",
        1 => "harmony_e2e=debug",
        _ => "harmony_e2e=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<RunConfig> {
    let config = match path {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RunConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn print_fixtures(format: Format, table: Table) -> anyhow::Result<()> {
    let value = match table {
        Table::All => serde_json::json!({
            "schedule": schedule(),
            "students": students(),
        }),
        Table::Schedule => serde_json::to_value(schedule())?,
        Table::Students => serde_json::to_value(students())?,
    };
    let rendered = match format {
        Format::Yaml => serde_yaml::to_string(&value)?,
        Format::Json => serde_json::to_string_pretty(&value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn print_today() {
    println!("date:         {}", dates::formatted_date());
    println!("day:          {}", dates::current_day_of_month());
    println!("month:        {}", dates::current_month_name());
    println!("year:         {}", dates::current_year());
    println!("time:         {}", dates::current_clock_time());
}

fn print_scenarios() {
    use harmony_e2e::scenarios;
    use harmony_e2e::testing::FakeHarmonyHub;

    for scenario in scenarios::all::<FakeHarmonyHub>() {
        println!("{:<12} {:<20} {}", scenario.id, scenario.suite, scenario.title);
    }
}

#[cfg(feature = "playwright")]
async fn run(config: RunConfig, filter: Option<&str>) -> anyhow::Result<bool> {
    use std::sync::Arc;

    use harmony_e2e::playwright::{PlaywrightDriver, PlaywrightFactory};
    use harmony_e2e::scenario::Runner;
    use harmony_e2e::scenarios;

    let suite = scenarios::filtered::<PlaywrightDriver>(filter);
    anyhow::ensure!(!suite.is_empty(), "no scenario matches {filter:?}");
    let config = Arc::new(config);
    let factory = PlaywrightFactory::launch(&config).await?;
    let runner = Runner::new(factory, Arc::clone(&config));
    let summary = runner.run(&suite).await;
    println!("{summary}");
    if let Ok(factory) = Arc::try_unwrap(runner.into_factory()) {
        factory.shutdown().await?;
    }
    Ok(summary.is_success())
}

#[cfg(not(feature = "playwright"))]
async fn run(_config: RunConfig, _filter: Option<&str>) -> anyhow::Result<bool> {
    anyhow::bail!("this build has no browser backend; rebuild with `--features playwright`")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            filter,
            base_url,
            workers,
        } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(base_url) = base_url {
                config.base_url = base_url;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            config.validate()?;
            if !run(config, filter.as_deref()).await? {
                std::process::exit(1);
            }
        }
        Commands::Fixtures { format, table } => print_fixtures(format, table)?,
        Commands::Today => print_today(),
        Commands::List => print_scenarios(),
    }

    Ok(())
}
