use clap::Parser;

use spendsort::cli::{self, CombineCli};

fn main() {
    let args = CombineCli::parse();
    cli::init_logging();

    if let Err(e) = cli::combine::run(&args.files, &args.output) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
