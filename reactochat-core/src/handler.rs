//! Event Handler (§4.C)
//!
//! Per-connection state and the low-level accept/drain/write routines the
//! reactor dispatches into. A handler owns exactly one fd: the listening
//! socket (status `Accept`) or a single accepted client connection.

#![allow(unsafe_code)]

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};

use tracing::{debug, warn};

use crate::config::READ_CHUNK_SIZE;
use crate::error::{ReactorError, Result};

/// What role a handler plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The listening socket; only ever produces `Accept` events.
    Listener,
    /// An accepted client connection.
    Client,
}

/// Registration status, mirroring the reference `m_status` guard used by
/// `remove()` to make double-removal a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Registered with the demultiplexer.
    Registered,
    /// Removed (or never registered).
    Unregistered,
}

/// A single fd and its bookkeeping. Owns the underlying socket and closes it
/// on drop.
pub struct EventHandler {
    fd: RawFd,
    role: Role,
    peer_addr: String,
    status: Status,
    stream: Option<TcpStream>,
}

impl EventHandler {
    /// Build a handler for the listening socket.
    #[must_use]
    pub fn for_listener(fd: RawFd) -> Self {
        Self {
            fd,
            role: Role::Listener,
            peer_addr: String::new(),
            status: Status::Unregistered,
            stream: None,
        }
    }

    /// Build a handler for an accepted client stream.
    #[must_use]
    pub fn for_client(stream: TcpStream, peer_addr: String) -> Self {
        let fd = stream.as_raw_fd();
        Self {
            fd,
            role: Role::Client,
            peer_addr,
            status: Status::Unregistered,
            stream: Some(stream),
        }
    }

    /// The handler's fd.
    #[must_use]
    pub const fn fd(&self) -> RawFd {
        self.fd
    }

    /// `"ip:port"` of the peer, empty for the listener.
    #[must_use]
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// The handler's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Current registration status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Mark the handler as registered with the demultiplexer.
    pub fn set_registered(&mut self) {
        self.status = Status::Registered;
    }

    /// Mark the handler as unregistered.
    pub fn set_unregistered(&mut self) {
        self.status = Status::Unregistered;
    }

    /// Accept one pending connection on the listening socket and build a
    /// client handler for it, setting the new socket non-blocking.
    ///
    /// Matches the reference `handAccept`: accept exactly once per call (the
    /// caller loops on further readiness via the edge-triggered event, not
    /// inside this function).
    pub fn accept(&self) -> Result<EventHandler> {
        debug_assert_eq!(self.role, Role::Listener);

        // SAFETY: `self.fd` is a valid, open listening socket fd owned by
        // this handler for the lifetime of the call.
        let listener = unsafe { std::net::TcpListener::from_raw_fd(self.fd) };
        let accept_result = listener.accept();
        // Don't let the temporary std::net::TcpListener close our fd.
        std::mem::forget(listener);

        let (stream, addr) = accept_result.map_err(ReactorError::Io)?;
        stream.set_nonblocking(true).map_err(ReactorError::Io)?;
        let peer_addr = addr.to_string();
        debug!(fd = stream.as_raw_fd(), %peer_addr, "accepted connection");
        Ok(EventHandler::for_client(stream, peer_addr))
    }

    /// Drain all pending bytes from an edge-triggered readable client socket
    /// into `out`, looping on [`READ_CHUNK_SIZE`]-sized reads until
    /// `EWOULDBLOCK`. Equivalent to
    /// `drain_into_with_chunk_size(out, READ_CHUNK_SIZE)`.
    pub fn drain_into(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        self.drain_into_with_chunk_size(out, READ_CHUNK_SIZE)
    }

    /// Same as [`Self::drain_into`], with an explicit per-`read` buffer size
    /// — the knob a caller's configuration layer overrides.
    ///
    /// Returns `Ok(n)` with the total bytes read. A 0-byte read, or any
    /// error other than would-block, is reported as
    /// [`ReactorError::PeerClosed`] / [`ReactorError::Transport`] so the
    /// reactor can close the connection, matching the reference `handRecv`.
    pub fn drain_into_with_chunk_size(&mut self, out: &mut Vec<u8>, chunk_size: usize) -> Result<usize> {
        let stream = self.stream.as_mut().expect("client handler has a stream");
        let mut buf = vec![0_u8; chunk_size];
        let mut total = 0;

        loop {
            match stream.read(&mut buf) {
                Ok(0) => {
                    return Err(ReactorError::PeerClosed(self.fd));
                }
                Ok(n) => {
                    out.extend_from_slice(&buf[..n]);
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(fd = self.fd, err = %e, "recv failed");
                    return Err(ReactorError::Transport { fd: self.fd, source: e });
                }
            }
        }
        Ok(total)
    }

    /// Write `payload` to the client, busy-retrying on `EWOULDBLOCK` exactly
    /// as the reference `handWrite` does (the socket is edge-triggered and
    /// oneshot for writes, so spinning here is bounded by kernel buffer
    /// availability rather than by an unbounded network stall).
    ///
    /// A 0-byte write, or any error other than would-block, is reported so
    /// the reactor closes the connection.
    pub fn write_all_retrying(&mut self, payload: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().expect("client handler has a stream");
        let mut offset = 0;

        while offset < payload.len() {
            match stream.write(&payload[offset..]) {
                Ok(0) => {
                    return Err(ReactorError::PeerClosed(self.fd));
                }
                Ok(n) => offset += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(fd = self.fd, err = %e, "write failed");
                    return Err(ReactorError::Transport { fd: self.fd, source: e });
                }
            }
        }
        Ok(())
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        if self.role == Role::Listener {
            // SAFETY: handler owns this fd exclusively; closing it here
            // matches ownership rules for the listener's raw fd created in
            // `listener::create_listen_socket`.
            unsafe {
                libc::close(self.fd);
            }
        }
        // Client sockets close via `self.stream`'s own Drop impl.
    }
}
