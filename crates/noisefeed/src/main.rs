//! Entry point: parse the CLI, initialise tracing, launch the renderer.

mod cli;
mod run;
mod settings;

use anyhow::Result;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();
    run::run(cli)
}
