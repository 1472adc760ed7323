//! Lobby host: HTTP/WebSocket transport around a [`card_lobby::LobbySession`].

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
