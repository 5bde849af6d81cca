// src/api/http/mod.rs

pub mod analytics;
pub mod chat;
pub mod handlers;
pub mod memory;
pub mod router;

pub use router::http_router;
