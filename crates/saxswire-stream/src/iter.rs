use std::io::Read;

use saxswire_frame::FrameConfig;
use saxswire_record::{CombinedMessage, FlowMetadata, Sample};
use tracing::{trace, warn};

use crate::error::StreamError;
use crate::reader::CombinedReader;

/// Streaming cursor over combined frames.
///
/// Call [`advance`](Self::advance) until it returns `false`, reading the
/// current message through the accessors in between. A clean end of stream
/// stops iteration with no error recorded; any other failure is kept in
/// [`last_error`](Self::last_error) and ends iteration for good.
///
/// It also implements [`Iterator`], yielding owned messages and stopping the
/// same way.
pub struct CombinedIter<R> {
    reader: CombinedReader<R>,
    current: Option<CombinedMessage>,
    error: Option<StreamError>,
    done: bool,
}

impl<R: Read> CombinedIter<R> {
    /// Create a new iterator with default configuration.
    pub fn new(inner: R) -> Self {
        Self::from_reader(CombinedReader::new(inner))
    }

    /// Create a new iterator with explicit configuration.
    pub fn with_config(inner: R, config: FrameConfig) -> Self {
        Self::from_reader(CombinedReader::with_config(inner, config))
    }

    pub(crate) fn from_reader(reader: CombinedReader<R>) -> Self {
        Self {
            reader,
            current: None,
            error: None,
            done: false,
        }
    }

    /// Move to the next message.
    ///
    /// Returns `true` if a message is available. Once this returns `false`
    /// it keeps returning `false` without touching the stream again.
    pub fn advance(&mut self) -> bool {
        if self.done {
            return false;
        }

        match self.reader.read_message() {
            Ok(message) => {
                self.current = Some(message);
                true
            }
            Err(StreamError::EndOfStream) => {
                trace!("combined stream ended");
                self.finish(None);
                false
            }
            Err(err) => {
                warn!(error = %err, "combined stream stopped");
                self.finish(Some(err));
                false
            }
        }
    }

    /// Stop iterating. The last decoded message stays readable.
    fn finish(&mut self, error: Option<StreamError>) {
        self.error = error;
        self.done = true;
    }

    /// The message produced by the most recent successful `advance`.
    pub fn current(&self) -> Option<&CombinedMessage> {
        self.current.as_ref()
    }

    /// The sample from the most recent successful `advance`.
    pub fn current_sample(&self) -> Option<&Sample> {
        self.current.as_ref().map(|message| &message.sample)
    }

    /// The flow metadata from the most recent successful `advance`.
    pub fn current_metadata(&self) -> Option<&FlowMetadata> {
        self.current.as_ref().map(|message| &message.flow_metadata)
    }

    /// The error that stopped iteration, if it was not a clean end of stream.
    pub fn last_error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    /// Take ownership of the stored error.
    pub fn take_error(&mut self) -> Option<StreamError> {
        self.error.take()
    }

    /// True once iteration has stopped, cleanly or not.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Consume the iterator and return the inner stream.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl<R: Read> Iterator for CombinedIter<R> {
    type Item = CombinedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            self.current.take()
        } else {
            None
        }
    }
}
