use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use u_plant_schedule::config::{InitialStockPolicy, SchedulerConfig, Strategy, DEFAULT_HORIZON_HOURS};
use u_plant_schedule::generator::RandomPlantSpec;
use u_plant_schedule::io::{load_plant, save_plan_report, save_plant_data, PlanReport};
use u_plant_schedule::scheduler::{PlanKpi, PlantScheduler};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "u_plant_schedule=info";

#[derive(Parser)]
#[command(
    name = "u-plant-schedule",
    about = "Greedy multi-unit production planner",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a plant described by a JSON file
    Plan {
        /// Plant description (JSON)
        #[arg(long)]
        input_file_path: PathBuf,
        /// Where to write the plan (JSON)
        #[arg(long)]
        output_file_path: PathBuf,
        /// Planning horizon in hours
        #[arg(long, default_value_t = DEFAULT_HORIZON_HOURS)]
        horizon_hours: f64,
        /// How units share the order pool
        #[arg(long, value_enum, default_value_t = StrategyArg::Competitive)]
        strategy: StrategyArg,
        /// Safety-stock handling for each unit's first run
        #[arg(long, value_enum, default_value_t = InitialStockArg::Exempt)]
        initial_stock: InitialStockArg,
    },
    /// Write a random plant description
    Generate {
        /// Where to write the plant (JSON)
        #[arg(long)]
        output_file_path: PathBuf,
        /// Random seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Competitive,
    Sequential,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Competitive => Strategy::Competitive,
            StrategyArg::Sequential => Strategy::Sequential,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum InitialStockArg {
    Exempt,
    TopUp,
}

impl From<InitialStockArg> for InitialStockPolicy {
    fn from(arg: InitialStockArg) -> Self {
        match arg {
            InitialStockArg::Exempt => InitialStockPolicy::Exempt,
            InitialStockArg::TopUp => InitialStockPolicy::TopUp,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            input_file_path,
            output_file_path,
            horizon_hours,
            strategy,
            initial_stock,
        } => {
            let config = SchedulerConfig::new()
                .with_horizon(horizon_hours)
                .with_strategy(strategy.into())
                .with_initial_stock_policy(initial_stock.into());
            plan(&input_file_path, &output_file_path, config)
        }
        Commands::Generate {
            output_file_path,
            seed,
        } => {
            let data = RandomPlantSpec::default().generate(seed);
            save_plant_data(&output_file_path, &data)
                .with_context(|| format!("writing {}", output_file_path.display()))?;
            info!(seed, path = %output_file_path.display(), "plant generated");
            Ok(())
        }
    }
}

/// `RUST_LOG` directives if given and well-formed, else the default.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn plan(input: &Path, output: &Path, config: SchedulerConfig) -> anyhow::Result<()> {
    let plant = load_plant(input).with_context(|| format!("loading {}", input.display()))?;
    let plan = PlantScheduler::new(&plant, config)?.run();

    let kpi = PlanKpi::calculate(&plan, &plant);
    info!(
        benefit = kpi.benefit,
        committed_benefit = kpi.committed_benefit,
        fill_rate = kpi.fill_rate,
        utilization = kpi.avg_utilization,
        grade_changes = kpi.grade_changes,
        "plan summary"
    );

    save_plan_report(output, &PlanReport::new(&plan, &plant))
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}
