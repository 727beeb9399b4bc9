use crate::reports;
use clap::Args;
use keyforge_evolve::api::{self, ContinueOptions, RunOptions};
use keyforge_evolve::corpus::Dataset;
use keyforge_evolve::geometry::KeyboardGeometry;
use keyforge_evolve::state::RunState;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

#[derive(Args, Debug, Clone)]
pub struct ResumeArgs {
    /// Snapshot of the run to continue
    #[arg(long)]
    pub from: PathBuf,

    #[arg(short, long, default_value_t = 50)]
    pub generations: usize,

    /// Config file for the continuation (defaults to the prior run's config)
    #[arg(long)]
    pub config_file: Option<String>,

    /// Where to write the continued run (defaults to overwriting --from)
    #[arg(long)]
    pub state: Option<PathBuf>,

    #[arg(long)]
    pub cache: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

pub fn run(args: ResumeArgs, geometry: KeyboardGeometry, dataset: Dataset) {
    let prior = RunState::load(&args.from).unwrap_or_else(|e| {
        error!("❌ Cannot read {}: {}", args.from.display(), e);
        process::exit(1);
    });
    info!(
        "📂 Loaded run {} at generation {} ({} individuals evaluated)",
        prior.run_id,
        prior.generation,
        prior.history.len()
    );

    let config = args
        .config_file
        .as_deref()
        .map(|path| super::resolve_config(&prior.config, Some(path)));
    let cols = geometry.slot_count().min(10);
    let options = RunOptions {
        state_path: Some(args.state.unwrap_or(args.from)),
        cache_path: args.cache,
        cancel: super::cancel_on_ctrl_c(),
    };
    let extra = ContinueOptions {
        generations: args.generations,
        config,
    };

    match api::continue_run(prior, extra, geometry, dataset, options) {
        Ok(result) => {
            reports::print_run_summary(&result);
            reports::print_top_individuals(&result.state.population, args.top);
            if let Some(best) = &result.best {
                reports::print_layout_grid("Best", best.chromosome(), cols);
            }
        }
        Err(e) => {
            error!("❌ Continuation failed: {}", e);
            process::exit(1);
        }
    }
}
