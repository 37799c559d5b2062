//! Convodesk - Conversation aggregate and bulk CSV ingestion core
//!
//! This crate implements the write/read consistency logic for a conversation
//! aggregate whose messages are stored either embedded (inline snapshots) or
//! referenced (independent records linked by key), plus a best-effort CSV
//! import pipeline with per-item bulk delete accounting.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
