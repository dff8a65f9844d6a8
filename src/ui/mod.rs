//! Web UI pages

mod handlers;

pub use handlers::*;
