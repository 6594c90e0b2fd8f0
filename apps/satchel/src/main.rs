//! # Satchel
//!
//! The command-line binary for a satchel document vault.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/satchel (THE BINARY)         │
//! │                                              │
//! │   ┌──────────────┐      ┌───────────────┐    │
//! │   │     CLI      │      │  satchel.toml │    │
//! │   │   (clap)     │      │    (toml)     │    │
//! │   └──────┬───────┘      └───────┬───────┘    │
//! │          └──────────┬───────────┘            │
//! │                     ▼                        │
//! │             ┌───────────────┐                │
//! │             │ satchel-core  │                │
//! │             │ (THE ENGINE)  │                │
//! │             └───────────────┘                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! satchel init
//! satchel briefcase create Work
//! satchel file add ./contract.pdf --narration "signed copy"
//! satchel briefcase move 2 1
//! satchel filter intersect aspect:3 collection:1
//! ```

use clap::Parser;
use satchel::AppConfig;
use satchel::cli::{self, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config, cli.verbose);

    if let Err(e) = cli::execute(cli, &config) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the subscriber. SATCHEL_LOG_FORMAT=json overrides the config file.
fn init_tracing(config: &AppConfig, verbose: bool) {
    let log_format =
        std::env::var("SATCHEL_LOG_FORMAT").unwrap_or_else(|_| config.logging.format.clone());

    let default_filter = if verbose {
        "satchel=debug,satchel_core=debug".to_string()
    } else {
        config.logging.filter.clone()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
