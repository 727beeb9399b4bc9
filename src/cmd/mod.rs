pub mod evolve;
pub mod resume;
pub mod score;

use keyforge_evolve::config::Config;
use keyforge_evolve::dispatch::CancelToken;
use std::process;
use tracing::{error, info, warn};

/// A JSON config file, if given, replaces the command-line search settings.
pub fn resolve_config(cli: &Config, file: Option<&str>) -> Config {
    match file {
        Some(path) => {
            info!("⚖️  Loading config from: {}", path);
            Config::load_from_file(path).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            })
        }
        None => cli.clone(),
    }
}

/// First Ctrl-C cancels the run; the last finished generation is kept.
pub fn cancel_on_ctrl_c() -> CancelToken {
    let cancel = CancelToken::new();
    let token = cancel.clone();
    std::thread::spawn(move || {
        let Ok(rt) = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        else {
            return;
        };
        rt.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("🛑 Interrupt received, keeping the last complete generation");
                token.cancel();
            }
        });
    });
    cancel
}
