//! WebSocket transport

pub mod connection;
