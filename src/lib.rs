//! Task Store Library
//!
//! Embedded SQLite persistence for tasks, projects, labels, time
//! tracking and external integrations. [`engine::Engine`] is the main
//! entry point; [`channels::ChannelHandler`] dispatches named
//! operations for host applications.

pub mod channels;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;
pub mod paths;
pub mod types;
