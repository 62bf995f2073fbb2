//! Core domain + application logic for the verification bot.
//!
//! Framework-agnostic: the Discord gateway and the verification API live
//! behind ports (traits) implemented in adapter crates.

pub mod api;
pub mod cards;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod migration;
pub mod ports;
pub mod progress;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
