use layertrace::{DenoiseOptions, Layertrace, LayertraceResult};

use crate::cli::DenoiseCommand;

use super::utils::write_outputs;

/// The main function to run the denoise command.
pub fn run(cmd: DenoiseCommand) -> LayertraceResult<()> {
    let options = DenoiseOptions::from(&cmd);
    let session = Layertrace::new().for_image(&cmd.output.input)?;
    let layers = session.quantize_denoised(&options)?;
    write_outputs(&layers, &cmd.output, &cmd.trace_options)
}
