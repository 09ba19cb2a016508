//! Plex Media Server adapter for the [`MediaServer`](crate::ports::MediaServer) port.

pub mod client;
mod wire;

pub use client::PlexClient;
