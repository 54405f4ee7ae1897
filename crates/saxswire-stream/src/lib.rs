//! Stream-level reading and writing of combined SAXS frames.
//!
//! [`CombinedWriter`] validates, serializes and frames one sample per call;
//! [`CombinedReader`] reverses the pipeline and verifies integrity before
//! anything is decoded; [`CombinedIter`] walks a stream frame by frame and
//! keeps the error that stopped it.
//!
//! ```
//! use std::io::Cursor;
//! use saxswire_record::{FlowMetadata, Sample};
//! use saxswire_stream::{CombinedReader, CombinedWriter};
//!
//! let sample = Sample::new(vec![0.1, 0.2, 0.3], vec![100.0, 150.0, 120.0]);
//! let mut writer = CombinedWriter::new(Cursor::new(Vec::new()));
//! writer.write_combined(&sample, &FlowMetadata::new("test_sample"))?;
//!
//! let mut reader = CombinedReader::new(Cursor::new(writer.into_inner().into_inner()));
//! let (decoded, flow) = reader.read_combined()?;
//! assert_eq!(decoded, sample);
//! assert_eq!(flow.sample, "test_sample");
//! # Ok::<(), saxswire_stream::StreamError>(())
//! ```

pub mod error;
pub mod iter;
pub mod reader;
pub mod source;
pub mod writer;

#[cfg(feature = "async")]
pub mod codec;

pub use error::{Result, StreamError};
pub use iter::CombinedIter;
pub use reader::CombinedReader;
pub use source::{pump, spawn, PumpError, SampleSource, SourceSender};
pub use writer::CombinedWriter;

#[cfg(feature = "async")]
pub use codec::CombinedCodec;
