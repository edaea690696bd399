//! AI image editing service
//!
//! Accepts edit requests for a user's image (background removal, search and
//! replace, recolor, relight), forwards them to the Stability AI image API in
//! the shape each action requires, and returns a normalized result. Also
//! serves the small gallery, profile and upload API the web client uses.

pub mod actions;
pub mod app;
pub mod auth;
pub mod cdn;
pub mod edit;
pub mod error;
pub mod fetch;
pub mod gallery;
pub mod models;
pub mod provider;
pub mod server;

pub use error::{Error, Result};
