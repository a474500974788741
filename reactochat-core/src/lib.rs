//! Reactochat Core
//!
//! Edge-triggered epoll reactor, connection registry, and cross-thread
//! message queue underlying the Reactochat server. This crate has no
//! knowledge of the chat wire protocol; see `reactochat-proto` for framing
//! and message types.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod epoll;
pub mod error;
pub mod handler;
pub mod listener;
pub mod queue;
pub mod reactor;

/// Common imports for consumers of this crate.
pub mod prelude {
    pub use crate::epoll::{Direction, Interest};
    pub use crate::error::{ReactorError, Result};
    pub use crate::handler::EventHandler;
    pub use crate::queue::MessageQueue;
    pub use crate::reactor::{IncomingMessage, Reactor};
}
