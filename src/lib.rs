//! shahquery - query typeahead and search results controller
//!
//! Shared modules for the shahquery CLI tool.

pub mod backend;
pub mod config;
pub mod controller;
pub mod errors;
pub mod logging;
pub mod render;
pub mod session;
pub mod timer;

pub use backend::{Backend, HttpBackend};
pub use controller::Controller;
pub use errors::BackendError;
pub use session::{Event, Session, SessionSettings, Snapshot};
