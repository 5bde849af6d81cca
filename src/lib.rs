// src/lib.rs

pub mod analytics;
pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod memory;
pub mod state;

pub use state::AppState;
