use std::os::unix::io::AsRawFd;
use std::sync::Arc;

use reactochat_core::epoll::Interest;
use reactochat_core::handler::EventHandler;
use reactochat_core::listener::create_listen_socket;
use reactochat_core::queue::MessageQueue;
use reactochat_core::reactor::Reactor;

#[test]
fn registered_fd_is_reachable_and_removal_is_idempotent() {
    let listener = create_listen_socket(0).unwrap();
    let fd = listener.as_raw_fd();
    std::mem::forget(listener);

    let inbound = Arc::new(MessageQueue::new());
    let reactor = Reactor::new(inbound).unwrap();
    reactor
        .register(EventHandler::for_listener(fd), Interest::Accept)
        .unwrap();

    assert!(reactor.get_handler(fd).is_some());

    reactor.remove(fd);
    assert!(reactor.get_handler(fd).is_none());

    // A second removal of an already-unregistered fd is a documented no-op,
    // not a panic.
    reactor.remove(fd);
    assert!(reactor.get_handler(fd).is_none());
}

#[test]
fn client_fds_excludes_the_listener() {
    let listener = create_listen_socket(0).unwrap();
    let listen_fd = listener.as_raw_fd();
    std::mem::forget(listener);

    let inbound = Arc::new(MessageQueue::new());
    let reactor = Reactor::new(inbound).unwrap();
    reactor
        .register(EventHandler::for_listener(listen_fd), Interest::Accept)
        .unwrap();

    assert!(reactor.client_fds().is_empty());
}

#[test]
fn write_to_unknown_fd_does_not_panic() {
    let inbound = Arc::new(MessageQueue::new());
    let reactor = Reactor::new(inbound).unwrap();
    reactor.write_to(999_999, b"hello");
}
