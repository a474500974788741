//! Reactor (§4.D)
//!
//! Owns the connection table (fd → [`EventHandler`]) and the I/O thread's
//! event loop. The table is guarded by a single [`parking_lot::Mutex`] so
//! that both the I/O thread (dispatching epoll events) and the worker thread
//! (writing replies back to clients) can reach a handler by fd, matching the
//! reference `Reactor::m_ep_events` map and its accompanying mutex.

use std::os::unix::io::RawFd;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::READ_CHUNK_SIZE;
use crate::epoll::{Direction, EpollDemultiplex, Interest};
use crate::error::{ReactorError, Result};
use crate::handler::EventHandler;
use crate::queue::MessageQueue;

/// One inbound chat payload, handed from the I/O thread to the worker thread.
///
/// Mirrors the reference `OnlineChatRoomMessage`.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Originating client fd.
    pub fd: RawFd,
    /// `"ip:port"` of the sender.
    pub peer_addr: String,
    /// Raw bytes read from the socket, possibly containing more than one
    /// concatenated JSON object.
    pub bytes: Vec<u8>,
}

type HandlerSlot = Arc<Mutex<EventHandler>>;

/// The reactor: connection table plus the epoll-driven dispatch loop.
pub struct Reactor {
    demux: Mutex<EpollDemultiplex>,
    table: Mutex<HashMap<RawFd, HandlerSlot>>,
    inbound: Arc<MessageQueue<IncomingMessage>>,
    read_chunk_size: usize,
}

impl Reactor {
    /// Create a reactor around a fresh epoll instance, feeding inbound
    /// payloads into `inbound`, draining sockets in
    /// [`READ_CHUNK_SIZE`]-byte chunks.
    pub fn new(inbound: Arc<MessageQueue<IncomingMessage>>) -> Result<Self> {
        Self::with_read_chunk_size(inbound, READ_CHUNK_SIZE)
    }

    /// Same as [`Self::new`], with an explicit per-`recv` buffer size — the
    /// knob a caller's configuration layer overrides.
    pub fn with_read_chunk_size(
        inbound: Arc<MessageQueue<IncomingMessage>>,
        read_chunk_size: usize,
    ) -> Result<Self> {
        let demux = EpollDemultiplex::new().map_err(ReactorError::Io)?;
        Ok(Self {
            demux: Mutex::new(demux),
            table: Mutex::new(HashMap::new()),
            inbound,
            read_chunk_size,
        })
    }

    /// Register a handler with the given interest and insert it into the
    /// connection table.
    pub fn register(&self, mut handler: EventHandler, interest: Interest) -> Result<()> {
        let fd = handler.fd();
        self.demux
            .lock()
            .register(fd, interest)
            .map_err(|source| ReactorError::Registration { fd, source })?;
        handler.set_registered();
        self.table.lock().insert(fd, Arc::new(Mutex::new(handler)));
        Ok(())
    }

    /// Remove a handler from the demultiplexer and the connection table.
    /// Guarded: does nothing if `fd` is not currently registered, matching
    /// the reference `removeEventHandle`'s status check.
    pub fn remove(&self, fd: RawFd) {
        let removed = self.table.lock().remove(&fd);
        if let Some(slot) = removed {
            let mut handler = slot.lock();
            if handler.status() == crate::handler::Status::Registered {
                self.demux.lock().remove(fd);
                handler.set_unregistered();
            }
        }
    }

    /// Switch a registered fd's epoll interest.
    pub fn modify(&self, fd: RawFd, direction: Direction) {
        self.demux.lock().modify(fd, direction);
    }

    /// Fetch a handler slot by fd, for writers outside the I/O thread.
    #[must_use]
    pub fn get_handler(&self, fd: RawFd) -> Option<HandlerSlot> {
        self.table.lock().get(&fd).cloned()
    }

    /// All currently connected client fds, excluding listening sockets.
    #[must_use]
    pub fn client_fds(&self) -> Vec<RawFd> {
        let demux = self.demux.lock();
        self.table
            .lock()
            .keys()
            .copied()
            .filter(|fd| !demux.is_listener(*fd))
            .collect()
    }

    /// Write `payload` to `fd`. On failure, closes and removes the
    /// connection, matching the reference `handWrite`'s fall-through to
    /// `handClose`.
    pub fn write_to(&self, fd: RawFd, payload: &[u8]) {
        let Some(slot) = self.get_handler(fd) else {
            warn!(fd, "write_to: no such connection");
            return;
        };
        let result = slot.lock().write_all_retrying(payload);
        if let Err(err) = result {
            warn!(fd, %err, "write failed, closing connection");
            self.remove(fd);
        }
    }

    /// Run the blocking epoll dispatch loop forever (or until an
    /// unrecoverable epoll error). Listener readiness repeatedly accepts
    /// until `EWOULDBLOCK`; client readiness drains and enqueues an
    /// [`IncomingMessage`]; `RDHUP`/`HUP`/`ERR` closes the connection.
    ///
    /// Dispatch priority matches the reference `wait_event`: accept before
    /// close before recv before write.
    pub fn run(&self) -> Result<()> {
        loop {
            let events = self.demux.lock().wait(-1).map_err(ReactorError::Io)?;
            for ev in events {
                let is_listener = self.demux.lock().is_listener(ev.fd);

                if is_listener {
                    self.drain_accepts(ev.fd);
                    continue;
                }
                if ev.closed {
                    info!(fd = ev.fd, "peer hung up or errored");
                    self.remove(ev.fd);
                    continue;
                }
                if ev.readable {
                    self.handle_recv(ev.fd);
                    continue;
                }
                if ev.writable {
                    // Edge-triggered oneshot writes are driven directly by
                    // `write_to` from the worker thread; a bare writable
                    // notification with nothing queued is a no-op.
                    continue;
                }
                warn!(fd = ev.fd, "epoll event with no recognized flags");
            }
        }
    }

    fn drain_accepts(&self, listen_fd: RawFd) {
        loop {
            let Some(slot) = self.get_handler(listen_fd) else {
                return;
            };
            let accepted = slot.lock().accept();
            match accepted {
                Ok(client) => {
                    let fd = client.fd();
                    if let Err(err) = self.register(client, Interest::Recv) {
                        error!(fd, %err, "failed to register accepted connection");
                    }
                }
                Err(ReactorError::Io(e)) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    warn!(%err, "accept failed");
                    break;
                }
            }
        }
    }

    fn handle_recv(&self, fd: RawFd) {
        let Some(slot) = self.get_handler(fd) else {
            return;
        };
        let mut buf = Vec::new();
        let (peer_addr, result) = {
            let mut handler = slot.lock();
            let peer_addr = handler.peer_addr().to_string();
            (peer_addr, handler.drain_into_with_chunk_size(&mut buf, self.read_chunk_size))
        };
        match result {
            Ok(0) => {}
            Ok(_) => {
                self.inbound.push(IncomingMessage {
                    fd,
                    peer_addr,
                    bytes: buf,
                });
            }
            Err(err) => {
                if !err.is_connection_error() {
                    warn!(fd, %err, "unexpected recv error");
                }
                self.remove(fd);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::create_listen_socket;
    use std::net::TcpStream;
    use std::os::unix::io::AsRawFd;

    #[test]
    fn accept_and_echo_roundtrip() {
        let listener = create_listen_socket(0).unwrap();
        let addr = listener.local_addr().unwrap();
        let listen_fd = listener.as_raw_fd();

        let inbound = Arc::new(MessageQueue::new());
        let reactor = Reactor::new(Arc::clone(&inbound)).unwrap();
        reactor
            .register(EventHandler::for_listener(listen_fd), Interest::Accept)
            .unwrap();
        std::mem::forget(listener);

        let mut client = TcpStream::connect(addr).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        reactor.drain_accepts(listen_fd);

        let clients = reactor.client_fds();
        assert_eq!(clients.len(), 1);

        use std::io::Write;
        client.write_all(b"{\"type\":\"text\"}").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        reactor.handle_recv(clients[0]);

        let msg = inbound.try_pop().expect("message enqueued");
        assert_eq!(msg.bytes, b"{\"type\":\"text\"}");

        reactor.write_to(clients[0], b"pong");
        let mut out = [0_u8; 4];
        use std::io::Read;
        client.set_nonblocking(false).unwrap();
        client.read_exact(&mut out).unwrap();
        assert_eq!(&out, b"pong");
    }
}
