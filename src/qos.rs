//! QoS: correlate a sent command with its expected reply by header, with
//! a monotonic timeout and cooperative cancellation.
//!
//! Frame headers ([`crate::message::Message::hdr`]) are the correlation
//! key throughout; a transmit registers the *response* header it expects
//! ([`crate::message::Message::rx_header`]) and waits for a matching
//! arrival.

use crate::error::RamsesError;
use crate::message::Message;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

/// A header-keyed table of in-flight requests awaiting their reply.
#[derive(Clone)]
pub struct QosTracker {
    pending: Arc<Mutex<HashMap<String, oneshot::Sender<Message>>>>,
}

impl QosTracker {
    pub fn new() -> QosTracker {
        QosTracker { pending: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Register interest in `header` and wait up to `timeout` for a
    /// matching message, as reported through [`QosTracker::satisfy`].
    pub async fn wait_for(&self, header: String, timeout: Duration) -> Result<Message, RamsesError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(header.clone(), tx);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(msg)) => Ok(msg),
            Ok(Err(_)) => Err(RamsesError::Cancelled),
            Err(_) => {
                self.pending.lock().await.remove(&header);
                Err(RamsesError::ProtocolTimeout(header))
            }
        }
    }

    /// Offer a received message to any waiter registered for its header.
    /// Returns `true` if a waiter was found and given the message.
    pub async fn satisfy(&self, header: &str, msg: Message) -> bool {
        let sender = self.pending.lock().await.remove(header);
        match sender {
            Some(tx) => tx.send(msg).is_ok(),
            None => false,
        }
    }

    /// Cooperative shutdown: wake every waiter with [`RamsesError::Cancelled`]
    /// by dropping its sender.
    pub async fn cancel_all(&self) {
        self.pending.lock().await.clear();
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl Default for QosTracker {
    fn default() -> QosTracker {
        QosTracker::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use chrono::Utc;

    fn msg(line: &str) -> Message {
        Message::new(Frame::parse(line).unwrap(), Utc::now())
    }

    #[tokio::test]
    async fn satisfies_a_waiting_request() {
        let tracker = QosTracker::new();
        let waiter = tracker.clone();
        let handle =
            tokio::spawn(
                async move { waiter.wait_for("3220|RP|10:050360".to_string(), Duration::from_secs(1)).await },
            );
        tokio::time::sleep(Duration::from_millis(10)).await;

        let reply = msg("RP --- 10:050360 30:258720 --:------ 3220 005 0040120166");
        assert!(tracker.satisfy("3220|RP|10:050360", reply).await);

        let got = handle.await.unwrap().unwrap();
        assert_eq!(got.frame.code, "3220");
    }

    #[tokio::test]
    async fn times_out_with_no_reply() {
        let tracker = QosTracker::new();
        let err = tracker.wait_for("9999|RP|01:000000".to_string(), Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, RamsesError::ProtocolTimeout(_)));
        assert_eq!(tracker.pending_count().await, 0);
    }

    #[tokio::test]
    async fn cancel_all_wakes_waiters() {
        let tracker = QosTracker::new();
        let waiter = tracker.clone();
        let handle = tokio::spawn(
            async move { waiter.wait_for("9999|RP|01:000000".to_string(), Duration::from_secs(5)).await },
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        tracker.cancel_all().await;

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, RamsesError::Cancelled));
    }
}
