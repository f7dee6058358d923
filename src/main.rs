use std::str::FromStr;

use clap::Parser;
use log::{LevelFilter, debug};

use archiview::cli::{self, Args};

fn main() -> Result<(), String> {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    debug!(args:?; "Parsed arguments");

    let stdout = std::io::stdout();
    cli::run(&args, &mut stdout.lock()).map_err(|e| e.to_string())
}
