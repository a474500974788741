//! Listening Socket Factory (§4.A)
//!
//! Creates, configures, and binds a non-blocking TCP/IPv4 listening socket.
//! Every step is fatal on failure: the socket (if created) is closed and the
//! caller aborts startup. There is no non-fatal recovery path here, matching
//! the reference `create_listen_socket`.

#![allow(unsafe_code)]

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd};

use socket2::{Domain, Socket, Type};
use tracing::info;

use crate::error::{ReactorError, Result};

/// Create, configure, bind, and listen a TCP/IPv4 socket on `0.0.0.0:port`,
/// using the default backlog ([`crate::config::LISTEN_BACKLOG`]).
pub fn create_listen_socket(port: u16) -> Result<StdTcpListener> {
    create_listen_socket_with_backlog(port, crate::config::LISTEN_BACKLOG)
}

/// Same as [`create_listen_socket`], with an explicit `listen(2)` backlog —
/// the knob a caller's configuration layer overrides.
///
/// Steps: allocate socket, enable `SO_REUSEADDR`, mark non-blocking, bind,
/// then `listen` with `backlog`. Returns the raw, already-`listen`ing
/// [`std::net::TcpListener`].
pub fn create_listen_socket_with_backlog(port: u16, backlog: i32) -> Result<StdTcpListener> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, None).map_err(ReactorError::ListenFailed)?;
    info!(fd = socket.as_raw_fd(), "created listening socket");

    socket.set_reuse_address(true).map_err(ReactorError::ListenFailed)?;
    info!("set SO_REUSEADDR");

    socket.set_nonblocking(true).map_err(ReactorError::ListenFailed)?;

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    socket.bind(&addr.into()).map_err(ReactorError::ListenFailed)?;
    info!(%addr, "bind success");

    socket.listen(backlog).map_err(ReactorError::ListenFailed)?;
    info!(port, backlog, "start listen");

    // SAFETY: `socket` owns a valid, open fd that we immediately hand off to
    // the std listener; `into_raw_fd` relinquishes ownership so there is no
    // double-close.
    let listener = unsafe { StdTcpListener::from_raw_fd(socket.into_raw_fd()) };
    Ok(listener)
}
