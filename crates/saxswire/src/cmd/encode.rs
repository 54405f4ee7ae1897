use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

use saxswire::csv::load_sample;
use saxswire::frame::{Compression, FrameConfig};
use saxswire::record::{CombinedMessage, FlowMetadata};
use saxswire::stream::{pump, spawn, PumpError};
use saxswire::CombinedWriter;
use tracing::{debug, info};

use crate::cmd::EncodeArgs;
use crate::exit::{csv_error, io_error, stream_error, CliError, CliResult, SUCCESS};

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    if args.sample.is_some() && args.files.len() > 1 {
        return Err(CliError::usage(
            "--sample names a single input; omit it to use each file stem",
        ));
    }
    if args.queue_depth == 0 {
        return Err(CliError::usage("--queue-depth must be at least 1"));
    }

    let compression = Compression::from(args.compression);
    if !compression.is_supported() {
        return Err(CliError::usage(format!(
            "compression {compression} is not supported by this build"
        )));
    }

    let sink = open_output(args.output.as_deref())?;
    let config = FrameConfig {
        max_payload_size: args.max_payload,
        compression,
    };
    let mut writer = CombinedWriter::with_config(sink, config);

    let files = args.files;
    let sample_name = args.sample;
    let source = spawn(args.queue_depth, move |tx| {
        for path in &files {
            let sample = load_sample(path).map_err(|err| csv_error(path, err))?;
            let name = sample_name.clone().unwrap_or_else(|| sample_id(path));
            debug!(file = %path.display(), sample = %name, points = sample.len(), "queued sample");

            let message = CombinedMessage::new(sample, FlowMetadata::new(name));
            if tx.send(message).is_err() {
                break;
            }
        }
        Ok::<(), CliError>(())
    })
    .map_err(|err| io_error("failed to start loader thread", err))?;

    let frames = pump(source, &mut writer).map_err(|err| match err {
        PumpError::Source(err) => err,
        PumpError::Stream(err) => stream_error("write failed", err),
    })?;
    info!(frames, compression = %compression, "encoded frames");
    Ok(SUCCESS)
}

fn open_output(path: Option<&Path>) -> CliResult<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|err| io_error(&format!("failed to create {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        None => {
            let stdout = io::stdout();
            if stdout.is_terminal() {
                return Err(CliError::usage(
                    "refusing to write binary frames to a terminal; use --output or a pipe",
                ));
            }
            Ok(Box::new(stdout.lock()))
        }
    }
}

/// Sample id derived from a file name: the stem, or the whole name if it has none.
fn sample_id(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
