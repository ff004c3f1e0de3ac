mod binary;
mod denoise;
mod quantize;
mod utils;

use crate::cli::{Cli, Commands};
use layertrace::LayertraceResult;

/// The main function to run the command based on CLI input.
pub fn run(cli: Cli) -> LayertraceResult<()> {
    dispatch(cli.command)
}

/// Dispatch the command to the appropriate handler.
fn dispatch(command: Commands) -> LayertraceResult<()> {
    match command {
        Commands::Binary(cmd) => binary::run(cmd),
        Commands::Quantize(cmd) => quantize::run(cmd),
        Commands::Denoise(cmd) => denoise::run(cmd),
    }
}
