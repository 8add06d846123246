//! Core domain + application logic for the Prozorro tender bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the Prozorro
//! HTTP API live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod feed;
pub mod formatting;
pub mod logging;
pub mod matcher;
pub mod messaging;
pub mod service;
pub mod tender;

pub use errors::{Error, Result};
