//! Profsearch CLI: search profiles or sequences against a FASTA corpus, or press a models file.

use anyhow::Result;
use clap::Parser;
use profsearch::engine::arg_parser::Cli;
use profsearch::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
