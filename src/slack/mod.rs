//! All Slack-specific functionality

pub mod client;
pub mod command_parser;

// Re-export main types for convenience
pub use client::SlackClient;
