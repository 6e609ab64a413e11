// src/main.rs

use std::path::Path;

use lifeline::cli::{self, CliArgs};
use lifeline::config::{self, Config};
use lifeline::errors::Result;
use lifeline::runner::Unwired;
use lifeline::signals::OsSignals;
use lifeline::tuning::{self, WorkerThreads};
use lifeline::{logging, report};

fn main() {
    let args = cli::parse();

    let config = config::load_or_default(args.config.as_deref())
        .and_then(|cfg| cfg.with_worker_threads(args.worker_threads));
    let config_level = config.as_ref().ok().and_then(|cfg| cfg.log().level);

    if let Err(err) = logging::init_logging(args.log_level, config_level) {
        eprintln!("lifeline error: {err:?}");
        std::process::exit(lifeline::EXIT_FAILURE);
    }

    let outcome = config.and_then(|cfg| run_main(&args, &cfg));
    std::process::exit(report(&outcome));
}

fn run_main(args: &CliArgs, cfg: &Config) -> Result<()> {
    let workers = tuning::tune(cfg.runtime(), Path::new(tuning::DEFAULT_CGROUP_ROOT))?;

    if args.print_config {
        print_config(cfg, workers);
        return Ok(());
    }

    let runtime = tuning::build_runtime(workers)?;
    runtime.block_on(async {
        let signals = OsSignals::new()?;
        lifeline::run(&Unwired, signals).await
    })
}

fn print_config(cfg: &Config, workers: WorkerThreads) {
    println!("lifeline configuration");
    println!(
        "  runtime.worker_threads = {}",
        cfg.runtime()
            .worker_threads
            .map_or_else(|| "auto".to_string(), |n| n.to_string())
    );
    println!(
        "  runtime.respect_cpu_quota = {}",
        cfg.runtime().respect_cpu_quota
    );
    match cfg.log().level {
        Some(level) => println!("  log.level = {level}"),
        None => println!("  log.level = (default)"),
    }
    println!();
    println!(
        "resolved worker threads: {} ({})",
        workers.count, workers.source
    );
}
