//! Discord-specific functionality

pub mod client;
pub mod interactions;

pub use client::DiscordClient;
