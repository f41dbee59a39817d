//! Caching strategy editor built on form-dispatch
//!
//! Exposed as a library so the pieces can be tested without a terminal.

pub mod action;
pub mod app;
pub mod backend;
pub mod config;
pub mod input;
pub mod strategy;
pub mod ui;
