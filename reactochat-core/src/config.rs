//! Reactor tuning knobs.
//!
//! Mirrors the reference server's compile-time constants as named defaults that
//! the binary crate's configuration layer can override.

/// Fixed read-buffer chunk size used by `handRecv` while draining an
/// edge-triggered socket (§4.C). The reference implementation uses a 1024-byte
/// stack buffer per `recv` call.
pub const READ_CHUNK_SIZE: usize = 1024;

/// Backlog passed to `listen(2)`.
pub const LISTEN_BACKLOG: i32 = 1024;

/// Maximum number of epoll events drained per `epoll_wait` call.
pub const MAX_EPOLL_EVENTS: usize = 1024;
