//! Chat-Room Worker (§4.F)
//!
//! Runs on its own thread, blocking on the reactor's inbound queue. For each
//! [`IncomingMessage`] it frames the raw bytes into JSON objects, parses
//! each independently (a parse failure drops that one object and continues
//! with the next), and dispatches by `type`:
//!
//! - `text` with `sender == "client"` stores the declared username for that
//!   fd and is not broadcast.
//! - any other `text` or `file` message is rewritten to carry the sender's
//!   stored username and fanned out to every connected client, including
//!   the original sender — the reference server's sender-exclusion check is
//!   present in source but commented out, so messages echo back.
//!
//! The client-info map is touched only from this thread; no lock is needed.

use std::collections::HashMap;
use std::os::unix::io::RawFd;
use std::sync::Arc;

use reactochat_core::queue::MessageQueue;
use reactochat_core::reactor::{IncomingMessage, Reactor};
use reactochat_proto::prelude::*;
use tracing::{debug, info, warn};

/// Per-connection chat state, keyed by fd. Single-writer: only the worker
/// thread ever mutates this map.
pub struct ClientInfo {
    pub username: String,
}

/// Consumes inbound byte buffers and drives the chat room.
pub struct ChatRoomWorker<'a> {
    reactor: &'a Reactor,
    inbound: Arc<MessageQueue<IncomingMessage>>,
    clients: HashMap<RawFd, ClientInfo>,
}

impl<'a> ChatRoomWorker<'a> {
    /// Build a worker bound to `reactor` for its writes and `inbound` for
    /// its input.
    #[must_use]
    pub fn new(reactor: &'a Reactor, inbound: Arc<MessageQueue<IncomingMessage>>) -> Self {
        Self {
            reactor,
            inbound,
            clients: HashMap::new(),
        }
    }

    /// Block forever, consuming and dispatching messages. Intended to run
    /// for the lifetime of the process on its own thread, joined only at
    /// shutdown.
    pub fn run(&mut self) {
        loop {
            let Some(envelope) = self.inbound.wait_and_pop() else {
                // Every sender was dropped; the reactor side is gone.
                return;
            };
            self.process_envelope(envelope);
        }
    }

    fn process_envelope(&mut self, envelope: IncomingMessage) {
        for object in extract_objects(&envelope.bytes) {
            match ChatMessage::parse(object) {
                Ok(msg) => self.dispatch(envelope.fd, &envelope.peer_addr, msg),
                Err(err) => {
                    warn!(fd = envelope.fd, %err, "dropping malformed chat object");
                }
            }
        }
    }

    fn dispatch(&mut self, fd: RawFd, peer_addr: &str, msg: ChatMessage) {
        match msg {
            ChatMessage::Text { sender, content, .. } if sender == "client" => {
                debug!(fd, %peer_addr, username = %content, "registered username");
                self.clients.insert(fd, ClientInfo { username: content });
            }
            ChatMessage::Text { content, .. } => {
                let reply = ChatMessage::Text {
                    sender: self.username_for(fd),
                    recipient: Some("client".to_string()),
                    timestamp: timestamp_ms(),
                    content,
                };
                self.broadcast(&reply);
            }
            file @ ChatMessage::File { .. } => {
                let mut file = file;
                file.set_sender(self.username_for(fd));
                self.broadcast(&file);
            }
        }
    }

    fn username_for(&self, fd: RawFd) -> String {
        self.clients
            .get(&fd)
            .map(|info| info.username.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn broadcast(&self, msg: &ChatMessage) {
        let payload = msg.to_json_bytes();
        let targets = self.reactor.client_fds();
        info!(recipients = targets.len(), "broadcasting message");
        for fd in targets {
            self.reactor.write_to(fd, &payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactochat_core::queue::MessageQueue;
    use reactochat_core::reactor::Reactor;

    #[test]
    fn registration_does_not_broadcast() {
        let inbound = Arc::new(MessageQueue::new());
        let reactor = Reactor::new(Arc::clone(&inbound)).unwrap();
        let mut worker = ChatRoomWorker::new(&reactor, inbound);

        let raw = br#"{"type":"text","sender":"client","recipient":"server","timestamp":"1","content":"alice"}"#;
        worker.process_envelope(IncomingMessage {
            fd: 7,
            peer_addr: "127.0.0.1:1".into(),
            bytes: raw.to_vec(),
        });

        assert_eq!(worker.username_for(7), "alice");
    }

    #[test]
    fn sticky_packet_yields_two_registrations() {
        let inbound = Arc::new(MessageQueue::new());
        let reactor = Reactor::new(Arc::clone(&inbound)).unwrap();
        let mut worker = ChatRoomWorker::new(&reactor, inbound);

        let a = br#"{"type":"text","sender":"client","recipient":"server","timestamp":"1","content":"alice"}"#;
        let mut buf = a.to_vec();
        let b = br#"{"type":"text","sender":"client","recipient":"server","timestamp":"2","content":"alice2"}"#;
        buf.extend_from_slice(b);

        worker.process_envelope(IncomingMessage {
            fd: 7,
            peer_addr: "127.0.0.1:1".into(),
            bytes: buf,
        });

        assert_eq!(worker.username_for(7), "alice2");
    }

    #[test]
    fn malformed_object_is_dropped_without_panicking() {
        let inbound = Arc::new(MessageQueue::new());
        let reactor = Reactor::new(Arc::clone(&inbound)).unwrap();
        let mut worker = ChatRoomWorker::new(&reactor, inbound);

        let raw = br#"{"type":"text","sender":"alice","content":"#;
        worker.process_envelope(IncomingMessage {
            fd: 7,
            peer_addr: "127.0.0.1:1".into(),
            bytes: raw.to_vec(),
        });
        // No panic, no registration.
        assert_eq!(worker.username_for(7), "unknown");
    }
}
