//! Configuration, shared models and process wiring.

pub mod config;
pub mod models;
pub mod services;
