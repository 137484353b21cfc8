//! Small shared helpers for URL construction and upstream authentication.

pub mod auth;
pub mod url;
