//! Lobster Room - live activity status for a fleet of OpenClaw gateways
//!
//! This library crate exposes internal modules for integration testing.

pub mod config;
pub mod data;
pub mod error;
pub mod integrations;
pub mod server;
pub mod status;
