use std::io::Read;

use saxswire::frame::{
    checksum, truncation_error, FrameError, FrameHeader, HEADER_SIZE, TRAILER_SIZE,
};
use serde::Serialize;
use tracing::warn;

use crate::cmd::{open_input, InspectArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, PROTOCOL_ERROR, SUCCESS};
use crate::output::{OutputFormat, Printer, Row};

/// Header fields and integrity status of one frame, without its payload.
#[derive(Debug, Serialize)]
struct FrameSummary {
    index: usize,
    offset: u64,
    version: u16,
    message_type: String,
    compression: String,
    payload_len: u64,
    frame_len: u64,
    checksum: String,
    checksum_ok: bool,
}

impl Row for FrameSummary {
    const HEADERS: &'static [&'static str] = &[
        "#", "OFFSET", "TYPE", "COMPRESSION", "PAYLOAD", "FRAME", "CRC32", "OK",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.index.to_string(),
            self.offset.to_string(),
            self.message_type.clone(),
            self.compression.clone(),
            self.payload_len.to_string(),
            self.frame_len.to_string(),
            self.checksum.clone(),
            if self.checksum_ok { "ok" } else { "MISMATCH" }.to_string(),
        ]
    }

    fn pretty(&self) -> String {
        format!(
            "#{} @{} type={} compression={} payload={} crc32={} {}",
            self.index,
            self.offset,
            self.message_type,
            self.compression,
            self.payload_len,
            self.checksum,
            if self.checksum_ok { "ok" } else { "MISMATCH" }
        )
    }
}

/// Summarize every frame in `wire`.
///
/// Checksum mismatches are reported per frame and the walk continues, since
/// the header still says where the next frame starts. A structural error
/// (bad magic or version, truncation) ends the walk.
fn walk(wire: &[u8]) -> (Vec<FrameSummary>, Option<FrameError>) {
    let mut frames = Vec::new();
    let mut offset = 0usize;

    while offset < wire.len() {
        let rest = &wire[offset..];
        let header = match FrameHeader::decode(rest) {
            Ok(header) => header,
            Err(err) => return (frames, Some(err)),
        };

        let frame_len = header.frame_len();
        if (rest.len() as u64) < frame_len {
            return (frames, Some(truncation_error(rest)));
        }

        // frame_len fits in rest.len(), so these casts cannot truncate.
        let payload_end = HEADER_SIZE + header.payload_len as usize;
        let payload = &rest[HEADER_SIZE..payload_end];
        let mut trailer = [0u8; TRAILER_SIZE];
        trailer.copy_from_slice(&rest[payload_end..payload_end + TRAILER_SIZE]);
        let carried = u32::from_le_bytes(trailer);

        frames.push(FrameSummary {
            index: frames.len(),
            offset: offset as u64,
            version: header.version,
            message_type: header.message_type.to_string(),
            compression: header.compression.to_string(),
            payload_len: header.payload_len,
            frame_len,
            checksum: format!("{carried:#010x}"),
            checksum_ok: checksum(payload) == carried,
        });
        offset += frame_len as usize;
    }

    (frames, None)
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let mut input = open_input(args.input.as_deref())?;
    let mut wire = Vec::new();
    input
        .read_to_end(&mut wire)
        .map_err(|err| io_error("failed to read input", err))?;

    let (frames, error) = walk(&wire);
    let mismatches = frames.iter().filter(|frame| !frame.checksum_ok).count();

    let mut printer = Printer::new(format);
    for frame in &frames {
        printer.emit(frame);
    }
    printer.finish();

    if let Some(err) = error {
        return Err(frame_error(
            &format!("stream invalid after {} frames", frames.len()),
            err,
        ));
    }
    if mismatches > 0 {
        warn!(mismatches, frames = frames.len(), "checksum mismatches found");
        return Err(CliError::new(
            PROTOCOL_ERROR,
            format!("{mismatches} of {} frames failed checksum verification", frames.len()),
        ));
    }
    Ok(SUCCESS)
}
