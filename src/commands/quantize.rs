use layertrace::{Layertrace, LayertraceResult, QuantizeOptions};

use crate::cli::QuantizeCommand;

use super::utils::write_outputs;

/// The main function to run the quantize command.
pub fn run(cmd: QuantizeCommand) -> LayertraceResult<()> {
    let options = QuantizeOptions::from(&cmd.quantize).with_stack(cmd.stack);
    let session = Layertrace::new()
        .with_default_quantize(options)
        .for_image(&cmd.output.input)?;
    let layers = session.quantize(None)?;
    write_outputs(&layers, &cmd.output, &cmd.trace_options)
}
