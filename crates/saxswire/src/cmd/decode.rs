use std::io::BufReader;

use saxswire::frame::FrameConfig;
use saxswire::record::CombinedMessage;
use saxswire::CombinedIter;
use serde::Serialize;
use tracing::info;

use crate::cmd::{open_input, DecodeArgs};
use crate::exit::{stream_error, CliResult, SUCCESS};
use crate::output::{range, OutputFormat, Printer, Row};

#[derive(Serialize)]
struct DecodedSample<'a> {
    index: usize,
    #[serde(flatten)]
    message: &'a CombinedMessage,
}

impl Row for DecodedSample<'_> {
    const HEADERS: &'static [&'static str] =
        &["#", "SAMPLE", "POINTS", "Q RANGE", "ERRORS", "PEAKS"];

    fn cells(&self) -> Vec<String> {
        let sample = &self.message.sample;
        vec![
            self.index.to_string(),
            self.message.sample_id().to_string(),
            sample.len().to_string(),
            range(&sample.q_values),
            if sample.has_errors() { "yes" } else { "no" }.to_string(),
            self.message.flow_metadata.peak_count().to_string(),
        ]
    }

    fn pretty(&self) -> String {
        let sample = &self.message.sample;
        format!(
            "#{} sample={} points={} q={} errors={} peaks={}",
            self.index,
            self.message.sample_id(),
            sample.len(),
            range(&sample.q_values),
            sample.has_errors(),
            self.message.flow_metadata.peak_count()
        )
    }
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = open_input(args.input.as_deref())?;
    let config = FrameConfig {
        max_payload_size: args.max_payload,
        ..FrameConfig::default()
    };
    let mut iter = CombinedIter::with_config(BufReader::new(input), config);
    let mut printer = Printer::new(format);

    let mut decoded = 0usize;
    while args.count.is_none_or(|count| decoded < count) && iter.advance() {
        if let Some(message) = iter.current() {
            printer.emit(&DecodedSample {
                index: decoded,
                message,
            });
        }
        decoded += 1;
    }
    printer.finish();

    if let Some(err) = iter.take_error() {
        return Err(stream_error(&format!("decode failed after {decoded} samples"), err));
    }
    info!(samples = decoded, "decoded stream");
    Ok(SUCCESS)
}
