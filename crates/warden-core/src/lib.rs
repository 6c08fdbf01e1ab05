//! # warden-core
//!
//! Core types, traits, configuration, and error handling for the Warden bot.

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod session;
