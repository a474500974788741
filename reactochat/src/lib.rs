//! Reactochat
//!
//! A TCP chat server built on an edge-triggered epoll reactor: one I/O
//! thread dispatches readiness events and hands raw bytes to a chat-room
//! worker thread over a blocking queue, which frames, parses, and fans out
//! JSON chat messages.

pub mod chatroom;
pub mod cli;
pub mod config;
pub mod logging;
pub mod ring;
