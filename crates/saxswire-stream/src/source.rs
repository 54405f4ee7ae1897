//! Background producers feeding a single writer.
//!
//! A [`CombinedWriter`] must not be shared between concurrent callers, so
//! producers run on their own thread and hand messages over a bounded
//! channel. The consumer side drains them into one writer with [`pump`].

use std::io::{self, Write};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, SendError, Sender};
use saxswire_record::CombinedMessage;
use tracing::{debug, trace};

use crate::error::StreamError;
use crate::writer::CombinedWriter;

/// Sending half handed to a producer closure.
pub struct SourceSender {
    tx: Sender<CombinedMessage>,
}

impl SourceSender {
    /// Queue one message, blocking while the channel is full.
    ///
    /// Fails once the consumer has gone away; producers should stop then.
    pub fn send(&self, message: CombinedMessage) -> Result<(), SendError<CombinedMessage>> {
        self.tx.send(message)
    }
}

/// Receiving half of a spawned producer.
///
/// Iterating yields messages in the order they were sent and ends when the
/// producer returns.
pub struct SampleSource<E> {
    rx: Receiver<CombinedMessage>,
    handle: JoinHandle<Result<(), E>>,
}

/// Run `producer` on a dedicated thread, buffering up to `capacity` messages.
pub fn spawn<E, F>(capacity: usize, producer: F) -> io::Result<SampleSource<E>>
where
    E: Send + 'static,
    F: FnOnce(&SourceSender) -> Result<(), E> + Send + 'static,
{
    let (tx, rx) = bounded::<CombinedMessage>(capacity);
    let handle = thread::Builder::new()
        .name("saxswire-source".to_string())
        .spawn(move || {
            let sender = SourceSender { tx };
            producer(&sender)
        })?;
    Ok(SampleSource { rx, handle })
}

impl<E> SampleSource<E> {
    /// Stop receiving and wait for the producer to return.
    ///
    /// Dropping the receiver first unblocks a producer stuck on a full
    /// channel. A panic in the producer is resumed on this thread.
    pub fn finish(self) -> Result<(), E> {
        drop(self.rx);
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl<E> Iterator for SampleSource<E> {
    type Item = CombinedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

/// Failure while draining a [`SampleSource`] into a writer.
#[derive(Debug, thiserror::Error)]
pub enum PumpError<E> {
    /// The producer returned an error.
    #[error("source error: {0}")]
    Source(#[source] E),
    /// Writing a frame failed.
    #[error("stream error: {0}")]
    Stream(#[source] StreamError),
}

/// Write every message from `source` through `writer`, in arrival order.
///
/// Returns the number of frames written. On a write failure the producer is
/// released and joined before the error is returned.
pub fn pump<E, W>(
    mut source: SampleSource<E>,
    writer: &mut CombinedWriter<W>,
) -> Result<usize, PumpError<E>>
where
    W: Write,
{
    let mut frames = 0usize;
    let mut failure = None;
    for message in source.by_ref() {
        if let Err(err) = writer.write_message(&message) {
            failure = Some(err);
            break;
        }
        frames += 1;
        trace!(frames, "pumped frame");
    }

    if let Some(err) = failure {
        debug!(frames, error = %err, "pump stopped on write failure");
        // A producer error at this point is a consequence of the closed channel.
        let _ = source.finish();
        return Err(PumpError::Stream(err));
    }

    source.finish().map_err(PumpError::Source)?;
    debug!(frames, "source drained");
    Ok(frames)
}
