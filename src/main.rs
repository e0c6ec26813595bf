mod catalog;
mod cli;
mod config;
mod generate;
mod identity;
mod model;
mod notify;
mod snapshot;
mod storage;
mod workflow;

use std::process;

use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();

    if let Err(e) = cli::run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
