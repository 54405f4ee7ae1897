use std::fmt;
use std::io;
use std::path::Path;

use saxswire::csv::CsvError;
use saxswire::frame::FrameError;
use saxswire::record::RecordError;
use saxswire::StreamError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
/// The byte stream is not a well-formed frame sequence.
pub const PROTOCOL_ERROR: i32 = 65;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ShortWrite { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(PROTOCOL_ERROR, format!("{context}: {other}")),
    }
}

pub fn record_error(context: &str, err: RecordError) -> CliError {
    let code = match err {
        RecordError::InvalidSample(_) => DATA_INVALID,
        RecordError::Decode(_) => PROTOCOL_ERROR,
        RecordError::Encode(_) => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn stream_error(context: &str, err: StreamError) -> CliError {
    match err {
        StreamError::EndOfStream => {
            CliError::new(FAILURE, format!("{context}: unexpected end of stream"))
        }
        StreamError::Frame(err) => frame_error(context, err),
        StreamError::Record(err) => record_error(context, err),
    }
}

pub fn csv_error(path: &Path, err: CsvError) -> CliError {
    let context = format!("failed to load {}", path.display());
    match err {
        CsvError::Io(source) => io_error(&context, source),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}
