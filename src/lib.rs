//! Groq-backed chat server with document context, webhooks and achievements - Library exports for testing
//!
//! (c) Softlandia 2025

pub mod api;
pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;
