use clap::Parser;
use conntrail::cli::{self, Cli};

fn main() {
    let args = Cli::parse();
    cli::init_logging(args.verbose);
    if let Err(err) = cli::run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
