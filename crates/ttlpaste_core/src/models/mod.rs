//! Data models for persistence and the API contract.

/// Paste record plus request/response payloads.
pub mod paste;
