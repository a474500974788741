//! Event Demultiplexer (§4.B)
//!
//! Edge-triggered readiness on Linux `epoll`. This module wraps the raw
//! `epoll_create1`/`epoll_ctl`/`epoll_wait` syscalls via `libc`, matching the
//! reference `EpollDemultiplex` one-to-one: `register` associates a fd with
//! readable interest by default and records the listening fd when the
//! `Accept` mask is set; `remove` is a guarded no-op for handlers that were
//! never registered; `modify` alternates between readable and writable
//! interest; `wait` blocks in `epoll_wait` and returns the ready fds plus
//! their event flags for the caller (the [`crate::reactor::Reactor`]) to
//! dispatch.

#![allow(unsafe_code)]

use std::collections::HashSet;
use std::io;
use std::os::unix::io::RawFd;

use tracing::{info, warn};

/// Interest requested at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// The fd is the listening socket; accept events are expected.
    Accept,
    /// Readable interest (client recv).
    Recv,
    /// Writable interest (client send).
    Send,
}

/// Direction passed to [`EpollDemultiplex::modify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Switch interest to readable.
    Read,
    /// Switch interest to writable.
    Write,
}

/// One readiness notification returned from [`EpollDemultiplex::wait`].
#[derive(Debug, Clone, Copy)]
pub struct ReadyEvent {
    /// The fd that became ready.
    pub fd: RawFd,
    /// True if the fd hung up or errored (`EPOLLRDHUP | EPOLLHUP | EPOLLERR`).
    pub closed: bool,
    /// True if the fd is readable.
    pub readable: bool,
    /// True if the fd is writable.
    pub writable: bool,
}

/// Edge-triggered epoll demultiplexer.
pub struct EpollDemultiplex {
    epoll_fd: RawFd,
    listen_fds: HashSet<RawFd>,
}

impl EpollDemultiplex {
    /// Create a new epoll instance.
    pub fn new() -> io::Result<Self> {
        // SAFETY: epoll_create1 with no flags is infallible given valid
        // argument types; the only failure mode is fd-table exhaustion,
        // which we surface as an `io::Error`.
        let epoll_fd = unsafe { libc::epoll_create1(0) };
        if epoll_fd < 0 {
            return Err(io::Error::last_os_error());
        }
        info!(epoll_fd, "init epoll demultiplex");
        Ok(Self {
            epoll_fd,
            listen_fds: HashSet::new(),
        })
    }

    /// True if `fd` was registered with [`Interest::Accept`]. The reference
    /// server only ever has one such fd; Reactochat generalizes this to a
    /// set so a single reactor can listen on multiple ports.
    #[must_use]
    pub fn is_listener(&self, fd: RawFd) -> bool {
        self.listen_fds.contains(&fd)
    }

    /// Register `fd` with the given interest. Defaults to edge-triggered
    /// readable (`EPOLLIN | EPOLLET | EPOLLRDHUP`); when `interest` is
    /// [`Interest::Accept`] the fd is additionally recorded as a listening
    /// fd.
    pub fn register(&mut self, fd: RawFd, interest: Interest) -> io::Result<()> {
        info!(fd, ?interest, "epoll demultiplex register");

        if interest == Interest::Accept {
            self.listen_fds.insert(fd);
        }

        let mut ev = libc::epoll_event {
            events: (libc::EPOLLIN | libc::EPOLLET | libc::EPOLLRDHUP) as u32,
            u64: fd as u64,
        };

        // SAFETY: `epoll_fd` is a valid epoll instance owned by `self`; `ev`
        // is a fully-initialized epoll_event on the stack for the duration of
        // the call.
        let ret = unsafe { libc::epoll_ctl(self.epoll_fd, libc::EPOLL_CTL_ADD, fd, &mut ev) };
        if ret < 0 {
            let err = io::Error::last_os_error();
            warn!(fd, %err, "epoll_ctl ADD failed");
            return Err(err);
        }
        Ok(())
    }

    /// Remove `fd` from the interest set. No-op (and logged, non-fatal) if the
    /// fd was never registered.
    pub fn remove(&mut self, fd: RawFd) {
        info!(fd, "epoll demultiplex remove");

        // SAFETY: the event pointer is unused by EPOLL_CTL_DEL on Linux but
        // must still be non-null prior to kernel 2.6.9; pass a zeroed one.
        let mut ev = libc::epoll_event { events: 0, u64: 0 };
        let ret = unsafe { libc::epoll_ctl(self.epoll_fd, libc::EPOLL_CTL_DEL, fd, &mut ev) };
        if ret < 0 {
            warn!(fd, err = %io::Error::last_os_error(), "epoll_ctl DEL failed (already removed?)");
        }
        self.listen_fds.remove(&fd);
    }

    /// Switch `fd`'s interest between readable and writable.
    ///
    /// Readable: `EPOLLIN | EPOLLET | EPOLLRDHUP`.
    /// Writable: `EPOLLOUT | EPOLLET | EPOLLONESHOT | EPOLLRDHUP`.
    ///
    /// Errors are logged and swallowed, matching the reference `modify`.
    pub fn modify(&mut self, fd: RawFd, direction: Direction) {
        let events = match direction {
            Direction::Read => libc::EPOLLIN | libc::EPOLLET | libc::EPOLLRDHUP,
            Direction::Write => libc::EPOLLOUT | libc::EPOLLET | libc::EPOLLONESHOT | libc::EPOLLRDHUP,
        };
        info!(fd, ?direction, "epoll demultiplex modify");

        let mut ev = libc::epoll_event {
            events: events as u32,
            u64: fd as u64,
        };
        // SAFETY: see `register`.
        let ret = unsafe { libc::epoll_ctl(self.epoll_fd, libc::EPOLL_CTL_MOD, fd, &mut ev) };
        if ret < 0 {
            warn!(fd, err = %io::Error::last_os_error(), "epoll_ctl MOD failed");
        }
    }

    /// Block until at least one fd is ready, or `timeout_ms` elapses
    /// (`-1` blocks forever). Returns one [`ReadyEvent`] per ready fd.
    pub fn wait(&self, timeout_ms: i32) -> io::Result<Vec<ReadyEvent>> {
        let mut raw = vec![libc::epoll_event { events: 0, u64: 0 }; crate::config::MAX_EPOLL_EVENTS];

        // SAFETY: `raw` has capacity `MAX_EPOLL_EVENTS`, matching the `maxevents`
        // argument; the kernel writes at most that many entries.
        let n = unsafe {
            libc::epoll_wait(
                self.epoll_fd,
                raw.as_mut_ptr(),
                raw.len() as i32,
                timeout_ms,
            )
        };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Vec::new());
            }
            return Err(err);
        }

        let mut out = Vec::with_capacity(n as usize);
        for ev in &raw[..n as usize] {
            let events = ev.events as i32;
            out.push(ReadyEvent {
                fd: ev.u64 as RawFd,
                closed: events & (libc::EPOLLRDHUP | libc::EPOLLHUP | libc::EPOLLERR) != 0,
                readable: events & libc::EPOLLIN != 0,
                writable: events & libc::EPOLLOUT != 0,
            });
        }
        Ok(out)
    }
}

impl Drop for EpollDemultiplex {
    fn drop(&mut self) {
        // SAFETY: `epoll_fd` is owned exclusively by `self` and not used again
        // after this call.
        unsafe {
            libc::close(self.epoll_fd);
        }
        info!(epoll_fd = self.epoll_fd, "close epoll demultiplex");
    }
}

// `EpollDemultiplex` owns a plain fd; it is fine to move it across threads.
unsafe impl Send for EpollDemultiplex {}
