use clap::{Parser, Subcommand};
use keyforge_evolve::corpus::Dataset;
use keyforge_evolve::geometry::KeyboardGeometry;
use std::process;
use tracing::{error, info};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Text corpus (UTF-8)
    #[arg(global = true, short = 'c', long, default_value = "data/corpus.txt")]
    corpus: String,

    /// Keyboard geometry JSON; the built-in 30-key board if omitted
    #[arg(global = true, short = 'k', long)]
    keyboard: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a new search
    Evolve(cmd::evolve::EvolveArgs),
    /// Continue a persisted search
    Resume(cmd::resume::ResumeArgs),
    /// Score layouts without searching
    Score(cmd::score::ScoreArgs),
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    info!("🚀 Initializing KeyForge Evolve...");

    let geometry = match &cli.keyboard {
        Some(path) => {
            info!("📂 Loading Keyboard: {}", path);
            KeyboardGeometry::load_from_file(path).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            })
        }
        None => {
            info!("⌨️  Using the built-in 30-key board");
            KeyboardGeometry::standard()
        }
    };

    let dataset = Dataset::load_from_file(&cli.corpus).unwrap_or_else(|e| {
        error!("❌ Cannot load corpus {}: {}", cli.corpus, e);
        process::exit(1);
    });

    match cli.command {
        Commands::Evolve(args) => cmd::evolve::run(args, geometry, dataset),
        Commands::Resume(args) => cmd::resume::run(args, geometry, dataset),
        Commands::Score(args) => cmd::score::run(args, geometry, dataset),
    }
}
