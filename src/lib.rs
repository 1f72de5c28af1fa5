//! Adaptive exam-question drilling: picks the next question, records each
//! attempt and derives mastery statistics from the recorded history.
//!
//! The binary in `main.rs` is a thin command-line front end over [`app::App`].

pub mod app;
pub mod config;
pub mod engine;
pub mod model;
pub mod session;
pub mod store;
