use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use futures::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::response::Response;

/// Default buffer size for the producer-side bounded channel feeding a
/// queue's log, used when a component doesn't have a more specific capacity
/// in mind (e.g. "one per route").
pub const DEFAULT_BUFFER_SIZE: usize = 16;

struct Inner {
    log: Vec<Response>,
    subscribers: Vec<mpsc::UnboundedSender<Response>>,
    done: bool,
}

/// A replayable, multi-subscriber stream of [`Response`]s produced by one
/// dispatch.
///
/// `append` is driven by a background task reading off a bounded producer
/// channel; `iter` can be called any number of times, before or after the
/// queue closes, and always replays the full log first. Subscriber channels
/// are unbounded so a slow or absent subscriber never blocks the producer;
/// the backpressure point is the bounded producer channel instead.
pub struct ResponseQueue {
    inner: Arc<Mutex<Inner>>,
}

impl ResponseQueue {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                log: Vec::new(),
                subscribers: Vec::new(),
                done: false,
            })),
        }
    }

    /// Builds a queue fed by spawning a task that drains `receiver` into the
    /// log until the channel closes, then marks the queue done. This is the
    /// shape every dispatching component uses: it holds the sending half of
    /// `receiver`'s channel and drops it (or the task producing into it
    /// finishes) once its responses are produced.
    pub fn from_receiver(mut receiver: mpsc::Receiver<Response>) -> Self {
        let queue = Self::new();
        let inner = Arc::clone(&queue.inner);
        tokio::spawn(async move {
            while let Some(response) = receiver.recv().await {
                Self::append(&inner, response);
            }
            Self::close(&inner);
        });
        queue
    }

    /// Builds an already-closed queue from a fixed set of responses. Useful
    /// for components (and tests) that have every response available
    /// up front and want to skip the bounded-channel plumbing.
    pub fn from_responses(responses: Vec<Response>) -> Self {
        let queue = Self::new();
        {
            let mut inner = queue.inner.lock();
            inner.log = responses;
            inner.done = true;
        }
        queue
    }

    fn append(inner: &Arc<Mutex<Inner>>, response: Response) {
        let mut guard = inner.lock();
        guard.subscribers.retain(|tx| tx.send(response.clone()).is_ok());
        guard.log.push(response);
    }

    fn close(inner: &Arc<Mutex<Inner>>) {
        let mut guard = inner.lock();
        guard.done = true;
        guard.subscribers.clear();
    }

    /// Registers a new subscriber channel, replays the current log to it,
    /// and returns a `Stream` over the backlog followed by live appends. If
    /// the queue is already closed, the returned stream is simply the log
    /// replayed in full, since there can be no further live appends.
    pub fn iter(&self) -> impl Stream<Item = Response> {
        let mut guard = self.inner.lock();
        let (tx, rx) = mpsc::unbounded_channel();
        for response in &guard.log {
            // Replay happens under the same lock that serializes `append`,
            // so there is no ordering gap between backlog and live items.
            let _ = tx.send(response.clone());
        }
        if !guard.done {
            guard.subscribers.push(tx);
        }
        UnboundedReceiverStream::new(rx)
    }

    /// Whether production into this queue has ended.
    pub fn is_done(&self) -> bool {
        self.inner.lock().done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn late_subscriber_gets_full_backlog_then_close() {
        let queue = ResponseQueue::from_responses(vec![
            Response::success(b"a".to_vec()),
            Response::success(b"b".to_vec()),
        ]);

        let collected: Vec<_> = queue.iter().collect().await;
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].payload(), b"a");
        assert_eq!(collected[1].payload(), b"b");
    }

    #[tokio::test]
    async fn iter_twice_on_closed_queue_yields_identical_sequences() {
        let queue = ResponseQueue::from_responses(vec![
            Response::success(b"x".to_vec()),
            Response::success(b"y".to_vec()),
            Response::success(b"z".to_vec()),
        ]);

        let first: Vec<_> = queue.iter().collect().await;
        let second: Vec<_> = queue.iter().collect().await;

        let first_payloads: Vec<_> = first.iter().map(|r| r.payload().to_vec()).collect();
        let second_payloads: Vec<_> = second.iter().map(|r| r.payload().to_vec()).collect();
        assert_eq!(first_payloads, second_payloads);
    }

    #[tokio::test]
    async fn live_subscriber_sees_appends_in_order_then_close() {
        let (tx, rx) = mpsc::channel(DEFAULT_BUFFER_SIZE);
        let queue = ResponseQueue::from_receiver(rx);

        let mut stream = Box::pin(queue.iter());

        tx.send(Response::success(b"1".to_vec())).await.unwrap();
        tx.send(Response::success(b"2".to_vec())).await.unwrap();
        drop(tx);

        let first = stream.next().await.unwrap();
        let second = stream.next().await.unwrap();
        assert_eq!(first.payload(), b"1");
        assert_eq!(second.payload(), b"2");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn zero_subscribers_does_not_block_producer_close() {
        let (tx, rx) = mpsc::channel(DEFAULT_BUFFER_SIZE);
        let queue = ResponseQueue::from_receiver(rx);
        tx.send(Response::success(Vec::new())).await.unwrap();
        drop(tx);

        // No subscriber ever called `iter`; give the background task a
        // chance to drain and close without anyone observing it.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(queue.is_done());
    }
}
