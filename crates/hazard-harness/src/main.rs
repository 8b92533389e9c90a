//! Offline scenario runner exercising `hazard-core` against the six worked
//! scenarios from the design notes. Not a wire protocol or a production
//! CLI; a developer tool for manual verification and executable
//! documentation.

mod config;
mod fixtures;
mod scenarios;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "hazard-harness", about = "Offline seismic hazard scenario runner")]
struct Args {
    /// Run only this scenario number (1-6). Runs all scenarios if omitted.
    #[arg(short, long)]
    scenario: Option<u8>,

    /// Emit tracing spans/events at debug level instead of info.
    #[arg(long)]
    verbose: bool,

    /// Load an IMTL set from a JSON file and run scenario 1 against it
    /// instead of its single-level default.
    #[arg(long)]
    imtls: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!("hazard_core={level}")))
        .init();

    if let Some(path) = &args.imtls {
        let imtls = config::load_imtls(path)?;
        tracing::info!(path = %path.display(), n_levels = imtls.len(), "loaded IMTL override");
        println!("{}", scenarios::scenario_1_with_imtls(imtls));
        return Ok(());
    }

    let outputs = match args.scenario {
        Some(1) => vec![scenarios::scenario_1_poisson_single_rupture()],
        Some(2) => vec![scenarios::scenario_2_far_away()],
        Some(3) => vec![scenarios::scenario_3_independent_union()],
        Some(4) => vec![scenarios::scenario_4_mutex_sum()],
        Some(5) => vec![scenarios::scenario_5_point_source_collapse()],
        Some(6) => vec![scenarios::scenario_6_nonparametric()],
        Some(other) => {
            eprintln!("unknown scenario {other}, valid range is 1-6");
            return Ok(());
        }
        None => scenarios::run_all(),
    };

    for line in outputs {
        println!("{line}");
    }
    Ok(())
}
