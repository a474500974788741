//! Reactochat server entry point.
//!
//! Binds a listening socket per positional port argument (falling back to
//! the configured port when none are given) into a single reactor, spawns
//! the chat-room worker on its own thread, installs a SIGINT/SIGTERM
//! handler that logs and exits (no in-flight drain — connections simply
//! close with the process, matching the reference server's lack of a
//! graceful-shutdown path), then runs the reactor's dispatch loop on the
//! main thread until it returns an unrecoverable error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use reactochat::chatroom::ChatRoomWorker;
use reactochat::cli::Cli;
use reactochat::config::ServerConfig;
use reactochat::logging;
use reactochat_core::epoll::Interest;
use reactochat_core::handler::EventHandler;
use reactochat_core::listener::create_listen_socket_with_backlog;
use reactochat_core::queue::MessageQueue;
use reactochat_core::reactor::Reactor;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_shutdown_signal(_: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

fn install_signal_handlers() {
    // SAFETY: the handler only stores to an atomic, which is async-signal-safe.
    unsafe {
        libc::signal(libc::SIGINT, handle_shutdown_signal as usize);
        libc::signal(libc::SIGTERM, handle_shutdown_signal as usize);
    }

    // `epoll_wait(-1)` only wakes on fd readiness, not on the atomic flag
    // above, so a dedicated watcher thread polls it and tears the process
    // down directly. This matches the reference server, which has no
    // graceful-shutdown path either: the process simply exits, taking every
    // open connection with it.
    std::thread::Builder::new()
        .name("shutdown-watcher".into())
        .spawn(|| loop {
            if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
                info!("shutdown signal received, exiting");
                std::process::exit(0);
            }
            std::thread::sleep(std::time::Duration::from_millis(100));
        })
        .expect("failed to spawn shutdown watcher thread");
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref());

    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    logging::init(log_level);
    install_signal_handlers();

    let ports: Vec<u16> = if cli.ports.is_empty() {
        vec![config.port]
    } else {
        cli.ports.clone()
    };
    info!(?config, ?ports, "starting reactochat");

    let inbound = Arc::new(MessageQueue::new());
    let reactor = Arc::new(
        Reactor::with_read_chunk_size(Arc::clone(&inbound), config.read_chunk_size)
            .context("failed to create reactor")?,
    );

    for port in &ports {
        let listener = create_listen_socket_with_backlog(*port, config.backlog)
            .with_context(|| format!("failed to create listening socket on port {port}"))?;
        let fd = std::os::unix::io::AsRawFd::as_raw_fd(&listener);
        std::mem::forget(listener); // ownership moves into the handler below
        reactor
            .register(EventHandler::for_listener(fd), Interest::Accept)
            .with_context(|| format!("failed to register listener for port {port}"))?;
        info!(port, fd, "listening");
    }

    let worker_reactor = Arc::clone(&reactor);
    let worker_inbound = Arc::clone(&inbound);
    let worker = std::thread::Builder::new()
        .name("chatroom-worker".into())
        .spawn(move || {
            let mut room = ChatRoomWorker::new(&worker_reactor, worker_inbound);
            room.run();
        })
        .context("failed to spawn chat-room worker thread")?;

    let run_result = reactor.run();
    if let Err(err) = &run_result {
        error!(%err, "reactor loop exited");
    }

    // Reaching here means the reactor hit an unrecoverable epoll error, not
    // a clean shutdown (those exit the process directly from the watcher
    // thread above). The worker thread blocks on `wait_and_pop` forever and
    // is not joined; the process exit below reclaims it.
    drop(worker);
    run_result.map_err(Into::into)
}
