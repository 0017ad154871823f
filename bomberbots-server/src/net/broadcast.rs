//! The append-only broadcast list.
//!
//! Every server message ever broadcast lives in one monotonic vector;
//! nodes are never mutated or reordered once appended. Each emitter owns
//! a plain index cursor into the list and waits on a length watch until
//! its successor exists, which gives all clients the same total order
//! from their join point forward.

use std::sync::{Arc, Mutex};

use bomberbots_protocol::ServerMessage;
use tokio::sync::watch;

/// Append-only list of broadcast messages with index cursors.
pub struct BroadcastList {
    messages: Mutex<Vec<Arc<ServerMessage>>>,
    len_tx: watch::Sender<usize>,
}

impl BroadcastList {
    /// Creates an empty list.
    pub fn new() -> Self {
        let (len_tx, _) = watch::channel(0);
        Self {
            messages: Mutex::new(Vec::new()),
            len_tx,
        }
    }

    /// Appends a message and wakes waiting emitters. Returns the index
    /// the message landed on.
    pub fn append(&self, message: ServerMessage) -> usize {
        let mut messages = self.messages.lock().expect("broadcast lock poisoned");
        messages.push(Arc::new(message));
        let len = messages.len();
        drop(messages);
        self.len_tx.send_replace(len);
        len - 1
    }

    /// Current length; also the index the next append will land on.
    pub fn len(&self) -> usize {
        *self.len_tx.borrow()
    }

    /// Whether nothing has been broadcast yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The message at `index`, if appended already.
    pub fn get(&self, index: usize) -> Option<Arc<ServerMessage>> {
        let messages = self.messages.lock().expect("broadcast lock poisoned");
        messages.get(index).cloned()
    }

    /// A fresh length watch for an emitter.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.len_tx.subscribe()
    }

    /// Waits until the message at `cursor` exists and returns it.
    ///
    /// Returns `None` only if the list is gone (session shutdown).
    pub async fn next(
        &self,
        cursor: usize,
        len_rx: &mut watch::Receiver<usize>,
    ) -> Option<Arc<ServerMessage>> {
        loop {
            if let Some(message) = self.get(cursor) {
                return Some(message);
            }
            len_rx.wait_for(|len| *len > cursor).await.ok()?;
        }
    }
}

impl Default for BroadcastList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(turn: u16) -> ServerMessage {
        ServerMessage::Turn {
            turn,
            events: Vec::new(),
        }
    }

    #[test]
    fn append_returns_dense_indices() {
        let list = BroadcastList::new();
        assert_eq!(list.append(msg(0)), 0);
        assert_eq!(list.append(msg(1)), 1);
        assert_eq!(list.len(), 2);
        assert_eq!(*list.get(1).unwrap(), msg(1));
        assert!(list.get(2).is_none());
    }

    #[tokio::test]
    async fn next_waits_for_the_append() {
        let list = Arc::new(BroadcastList::new());
        let mut rx = list.subscribe();

        let waiter = {
            let list = list.clone();
            tokio::spawn(async move { list.next(0, &mut rx).await })
        };
        tokio::task::yield_now().await;
        list.append(msg(7));

        let got = waiter.await.unwrap().unwrap();
        assert_eq!(*got, msg(7));
    }

    #[tokio::test]
    async fn two_cursors_see_the_same_order() {
        let list = Arc::new(BroadcastList::new());
        for turn in 0..5 {
            list.append(msg(turn));
        }
        // A late cursor anchored mid-list sees the common suffix.
        let mut rx = list.subscribe();
        let mut seen = Vec::new();
        for cursor in 2..5 {
            let message = list.next(cursor, &mut rx).await.unwrap();
            seen.push((*message).clone());
        }
        assert_eq!(seen, vec![msg(2), msg(3), msg(4)]);
    }
}
