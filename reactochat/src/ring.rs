//! Recent-Message Ring (§3, §10.6)
//!
//! The reference source also ships a second, ASIO-coroutine-based chat
//! engine with session-local timers and an in-order writer coroutine. Its
//! distinguishing data structure — a capped ring of recently delivered
//! messages replayed to new joiners — is reproduced here as a standalone
//! module. It is intentionally **not** wired into [`crate::chatroom`] or
//! the reactor's default run path: the primary engine is the epoll Reactor,
//! and this module exists so the alternate engine's behavior isn't lost if
//! a future participant type wants it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Maximum number of messages retained for replay to new joiners.
pub const MAX_RECENT_MESSAGES: usize = 100;

/// Anything that can receive a delivered message. Implemented by whatever
/// connection abstraction a caller plugs in (a socket wrapper, a test
/// probe, a channel sender).
pub trait ChatParticipant: Send + Sync {
    /// Deliver one message to this participant.
    fn deliver(&self, msg: &str);
}

/// A chat room with join/leave membership and a bounded recent-message
/// replay buffer, matching the reference `chat_room`.
#[derive(Default)]
pub struct ChatRoom {
    inner: Mutex<ChatRoomInner>,
}

#[derive(Default)]
struct ChatRoomInner {
    participants: Vec<Arc<dyn ChatParticipant>>,
    recent: VecDeque<String>,
}

impl ChatRoom {
    /// Build an empty room.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant and replay the recent-message buffer to it.
    pub fn join(&self, participant: Arc<dyn ChatParticipant>) {
        let mut inner = self.inner.lock().expect("chat room mutex poisoned");
        for msg in &inner.recent {
            participant.deliver(msg);
        }
        inner.participants.push(participant);
    }

    /// Remove a participant, identified by pointer equality.
    pub fn leave(&self, participant: &Arc<dyn ChatParticipant>) {
        let mut inner = self.inner.lock().expect("chat room mutex poisoned");
        inner
            .participants
            .retain(|p| !Arc::ptr_eq(p, participant));
    }

    /// Deliver `msg` to every current participant, then record it in the
    /// recent-message ring, evicting the oldest entry once the ring exceeds
    /// [`MAX_RECENT_MESSAGES`].
    pub fn deliver(&self, msg: &str) {
        let mut inner = self.inner.lock().expect("chat room mutex poisoned");
        inner.recent.push_back(msg.to_string());
        while inner.recent.len() > MAX_RECENT_MESSAGES {
            inner.recent.pop_front();
        }
        for participant in &inner.participants {
            participant.deliver(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct Recorder(StdMutex<Vec<String>>);

    impl ChatParticipant for Recorder {
        fn deliver(&self, msg: &str) {
            self.0.lock().unwrap().push(msg.to_string());
        }
    }

    #[test]
    fn new_joiner_receives_recent_backlog() {
        let room = ChatRoom::new();
        room.deliver("hello");
        room.deliver("world");

        let late = Arc::new(Recorder(StdMutex::new(Vec::new())));
        room.join(late.clone());

        assert_eq!(*late.0.lock().unwrap(), vec!["hello", "world"]);
    }

    #[test]
    fn ring_is_capped_at_max_recent_messages() {
        let room = ChatRoom::new();
        for i in 0..150 {
            room.deliver(&i.to_string());
        }

        let late = Arc::new(Recorder(StdMutex::new(Vec::new())));
        room.join(late.clone());

        let backlog = late.0.lock().unwrap();
        assert_eq!(backlog.len(), MAX_RECENT_MESSAGES);
        assert_eq!(backlog[0], "50");
        assert_eq!(backlog[backlog.len() - 1], "149");
    }

    #[test]
    fn leave_stops_future_delivery() {
        let room = ChatRoom::new();
        let participant = Arc::new(Recorder(StdMutex::new(Vec::new())));
        room.join(participant.clone());
        room.leave(&(participant.clone() as Arc<dyn ChatParticipant>));
        room.deliver("after leaving");
        assert!(participant.0.lock().unwrap().is_empty());
    }
}
