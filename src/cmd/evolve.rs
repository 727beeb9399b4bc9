use crate::reports;
use clap::Args;
use keyforge_evolve::api::{self, RunOptions};
use keyforge_evolve::config::Config;
use keyforge_evolve::corpus::Dataset;
use keyforge_evolve::geometry::KeyboardGeometry;
use std::path::PathBuf;
use std::process;
use tracing::error;

#[derive(Args, Debug, Clone)]
pub struct EvolveArgs {
    #[command(flatten)]
    pub config: Config,

    /// JSON config file (replaces the flags above)
    #[arg(long)]
    pub config_file: Option<String>,

    /// Run state snapshot written every generation
    #[arg(long, default_value = "run_state.json")]
    pub state: PathBuf,

    /// Fitness cache reused across runs
    #[arg(long)]
    pub cache: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

pub fn run(args: EvolveArgs, geometry: KeyboardGeometry, dataset: Dataset) {
    let config = super::resolve_config(&args.config, args.config_file.as_deref());
    let cols = geometry.slot_count().min(10);
    let options = RunOptions {
        state_path: Some(args.state),
        cache_path: args.cache,
        cancel: super::cancel_on_ctrl_c(),
    };

    match api::run(config, geometry, dataset, options) {
        Ok(result) => {
            reports::print_run_summary(&result);
            reports::print_top_individuals(&result.state.population, args.top);
            if let Some(best) = &result.best {
                reports::print_layout_grid("Best", best.chromosome(), cols);
            }
        }
        Err(e) => {
            error!("❌ Run failed: {}", e);
            process::exit(1);
        }
    }
}
