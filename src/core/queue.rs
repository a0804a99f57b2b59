//! The shared record queue between producers and the listener

use super::record::LogRecord;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// An item travelling through the queue
#[derive(Debug, Clone)]
pub enum Message {
    Record(Box<LogRecord>),
    /// Tells the listener to stop after everything queued before it
    Shutdown,
}

/// Cloneable producer side of an aggregator's queue.
///
/// Enqueueing never blocks: the queue is unbounded.
#[derive(Debug, Clone)]
pub struct QueueHandle {
    sender: Sender<Message>,
}

impl QueueHandle {
    /// Push a record. Returns `false` if the listener is gone and the record
    /// was discarded.
    pub fn enqueue(&self, record: LogRecord) -> bool {
        self.sender.send(Message::Record(Box::new(record))).is_ok()
    }

    pub(crate) fn send_shutdown(&self) -> bool {
        self.sender.send(Message::Shutdown).is_ok()
    }

    /// Records waiting for the listener
    pub fn pending(&self) -> usize {
        self.sender.len()
    }
}

/// Create an unbounded multi-producer / single-consumer queue.
pub(crate) fn record_queue() -> (QueueHandle, Receiver<Message>) {
    let (sender, receiver) = unbounded();
    (QueueHandle { sender }, receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CallSite, LogLevel};

    #[test]
    fn test_enqueue_preserves_order() {
        let (handle, receiver) = record_queue();
        let site = CallSite::new("q.rs", 1, "f");
        for i in 0..3 {
            assert!(handle.enqueue(LogRecord::new(LogLevel::Info, "q", site, format!("{}", i))));
        }
        assert!(handle.send_shutdown());
        assert_eq!(handle.pending(), 4);

        let messages: Vec<String> = receiver
            .try_iter()
            .filter_map(|m| match m {
                Message::Record(r) => Some(r.message),
                Message::Shutdown => None,
            })
            .collect();
        assert_eq!(messages, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_enqueue_after_receiver_dropped() {
        let (handle, receiver) = record_queue();
        drop(receiver);
        let record = LogRecord::new(LogLevel::Info, "q", CallSite::new("q.rs", 1, "f"), "lost");
        assert!(!handle.enqueue(record));
    }
}
