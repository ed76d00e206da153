//! A small bridge for the "async generator with a return value" shape that
//! shows up whenever a driving task both emits a sequence of values to a
//! consumer and produces one final result once it's done. Rust has no
//! generator-return-value primitive, so this crate provides the channel
//! pair the rest of the workspace uses instead: an [`EventSink`] the
//! producer task sends through, paired with a [`BoxStream`] the consumer
//! drives, plus a `JoinHandle` carrying the terminal value.

use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

/// The producer side of an event channel. Cloning is cheap; every clone
/// shares the same bounded channel. Sending after the consumer has dropped
/// the stream is a silent no-op — the producer is expected to keep running
/// to completion regardless of whether anyone is still listening.
#[derive(Clone)]
pub struct EventSink<T> {
    tx: mpsc::Sender<T>,
}

impl<T> EventSink<T> {
    pub async fn send(&self, event: T) {
        let _ = self.tx.send(event).await;
    }
}

/// Creates a bounded event channel: an [`EventSink`] for the producer and a
/// [`BoxStream`] for the consumer. `buffer` bounds how far a slow consumer
/// lets the producer run ahead before it backpressures.
pub fn channel<T: Send + 'static>(buffer: usize) -> (EventSink<T>, BoxStream<'static, T>) {
    let (tx, rx) = mpsc::channel(buffer);
    let sink = EventSink { tx };
    let stream = Box::pin(ReceiverStream::new(rx));
    (sink, stream)
}

/// A running producer task paired with the stream it feeds. `result()`
/// awaits the task's terminal value; it may be called before or after the
/// stream has been fully drained, but a consumer that wants every event
/// should drain the stream to completion before awaiting the result to
/// avoid racing the channel closing against the task's own exit.
pub struct DrivenStream<T, R> {
    pub events: BoxStream<'static, T>,
    handle: JoinHandle<R>,
}

impl<T, R> DrivenStream<T, R> {
    pub fn new(events: BoxStream<'static, T>, handle: JoinHandle<R>) -> Self {
        Self { events, handle }
    }

    /// Awaits the producer task's terminal value. Panics if the task
    /// panicked; callers that spawn the producer control that invariant.
    pub async fn result(self) -> R {
        self.handle.await.expect("producer task panicked")
    }

    /// Splits into the stream and the raw `JoinHandle`, for callers outside
    /// this crate that want to drain events and await the result separately
    /// (a destructuring `let DrivenStream { events, handle } = ...` only
    /// works from within this crate, since `handle` is private).
    pub fn split(self) -> (BoxStream<'static, T>, JoinHandle<R>) {
        (self.events, self.handle)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn events_are_delivered_in_send_order() {
        let (sink, stream) = channel::<u32>(8);
        let handle = tokio::spawn(async move {
            for i in 0..3 {
                sink.send(i).await;
            }
            "done"
        });
        let DrivenStream { events, handle } = DrivenStream::new(stream, handle);
        let collected: Vec<u32> = events.collect().await;
        assert_eq!(collected, vec![0, 1, 2]);
        assert_eq!(handle.await.unwrap(), "done");
    }

    #[tokio::test]
    async fn send_after_consumer_drop_does_not_panic() {
        let (sink, stream) = channel::<u32>(1);
        drop(stream);
        sink.send(1).await;
    }
}
