//! Command-line entry point.

use clap::Parser;
use inkboard_app::CliArgs;

fn main() {
    env_logger::init();
    let args = CliArgs::parse();
    log::debug!("{:?}", args);

    if let Err(e) = inkboard_app::run(args) {
        log::error!("{}", e);
        eprintln!("inkboard: {}", e);
        std::process::exit(1);
    }
}
