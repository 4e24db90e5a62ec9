use clap::Parser;

use spendsort::cli::{self, Cli};

fn main() {
    let args = Cli::parse();
    cli::init_logging();

    if let Err(e) = cli::report::run(args.days) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
