//! Request extractors and error mapping shared by all handlers.

pub mod auth;
pub mod error;
