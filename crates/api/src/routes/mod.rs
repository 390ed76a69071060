//! HTTP route handlers.

pub mod status;
