use crate::reports;
use clap::Args;
use keyforge_evolve::api;
use keyforge_evolve::chromosome::{CharacterSet, Chromosome, Layer, LayerBounds};
use keyforge_evolve::config::Config;
use keyforge_evolve::corpus::Dataset;
use keyforge_evolve::error::{KeyForgeError, KfResult};
use keyforge_evolve::geometry::KeyboardGeometry;
use keyforge_evolve::layouts::KnownLayout;
use keyforge_evolve::state::RunState;
use std::path::PathBuf;
use std::process;
use strum::IntoEnumIterator;
use tracing::{error, warn};

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub config: Config,

    /// Layers separated by '|', each a permutation of the character set
    #[arg(short, long)]
    pub layout: Option<String>,

    /// Normalize with the window frozen in this run snapshot
    #[arg(long)]
    pub window_from: Option<PathBuf>,
}

fn parse_layout(s: &str, charset: &CharacterSet) -> KfResult<Chromosome> {
    let layers = s
        .split('|')
        .map(|part| Layer::new(part.trim().chars().collect(), charset))
        .collect::<KfResult<Vec<_>>>()?;
    if layers.is_empty() {
        return Err(KeyForgeError::InvalidChromosome("empty layout".into()));
    }
    let max = layers.len();
    Chromosome::new(layers, charset, LayerBounds::new(1, max)?)
}

pub fn run(args: ScoreArgs, geometry: KeyboardGeometry, dataset: Dataset) {
    let charset = args.config.search.charset().unwrap_or_else(|e| {
        error!("{}", e);
        process::exit(1);
    });

    let window = args.window_from.as_ref().and_then(|p| match RunState::load(p) {
        Ok(state) => state.window,
        Err(e) => {
            warn!("⚠️  Ignoring {}: {}", p.display(), e);
            None
        }
    });

    let candidates: Vec<(String, Chromosome)> = match &args.layout {
        Some(s) => match parse_layout(s, &charset) {
            Ok(c) => vec![("Custom".to_string(), c)],
            Err(e) => {
                error!("❌ {}", e);
                process::exit(1);
            }
        },
        None => KnownLayout::iter()
            .map(|k| (k.to_string(), Chromosome::single(k.to_layer(&charset))))
            .collect(),
    };

    for (name, chromosome) in candidates {
        match api::score_layout(
            &chromosome,
            geometry.clone(),
            dataset.clone(),
            &args.config,
            window,
        ) {
            Ok(r) => reports::print_score(&name, &r),
            Err(e) => error!("❌ {}: {}", name, e),
        }
    }
}
