//! Framed MessagePack transport for SAXS samples.
//!
//! saxswire moves one scattering sample and its pipeline metadata per frame
//! across pipes, sockets or files, with a CRC-32 integrity check on every
//! payload.
//!
//! # Crate Structure
//!
//! - [`frame`]: header codec, checksum, compression dispatch
//! - [`record`]: `Sample`, `FlowMetadata` and their MessagePack encoding
//! - [`stream`]: blocking writer, reader and iterator over a byte stream
//! - [`csv`]: loading samples from three-column text files

pub mod csv;

/// Re-export frame types.
pub mod frame {
    pub use saxswire_frame::*;
}

/// Re-export record types.
pub mod record {
    pub use saxswire_record::*;
}

/// Re-export stream types.
pub mod stream {
    pub use saxswire_stream::*;
}

pub use saxswire_record::{FlowMetadata, Sample};
pub use saxswire_stream::{CombinedIter, CombinedReader, CombinedWriter, StreamError};
