//! Internal modules for the lobby client.
//!
//! This library provides command parsing and the WebSocket client used by
//! the cl_client binary.

pub mod commands;
pub mod websocket_client;
