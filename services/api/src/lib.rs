//! HIPAA Shield Advisor API Library Crate
//!
//! This library contains the web service around the advisor core: the
//! configuration, the in-memory page sessions, the API handlers and the
//! routing. The `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod session;
pub mod state;
