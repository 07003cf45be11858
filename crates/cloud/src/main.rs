//! Command-line entry point: run the super-droplet cloud model from a
//! YAML configuration file.
//!
//! Exit codes: 0 success, 1 configuration or IO error, 2 initialisation
//! error, 3 runtime error (convergence, motion or invariant failure).

use std::path::Path;
use std::process;

fn main() {
    env_logger::init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "cloud".into());
    let config_path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => {
            eprintln!("usage: {} <config.yaml>", program);
            process::exit(1);
        }
    };

    if let Err(err) = cloud::run(Path::new(&config_path)) {
        log::error!("{}", err);
        eprintln!("error: {}", err);
        process::exit(err.exit_code());
    }
}
