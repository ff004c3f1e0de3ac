use layertrace::{BinaryOptions, Layertrace, LayertraceResult};

use crate::cli::BinaryCommand;

use super::utils::write_outputs;

/// The main function to run the binary command.
pub fn run(cmd: BinaryCommand) -> LayertraceResult<()> {
    let session = Layertrace::new().for_image(&cmd.output.input)?;
    let options = BinaryOptions::from(&cmd);
    let layers = session.binary(&options)?;
    write_outputs(&layers, &cmd.output, &cmd.trace_options)
}
