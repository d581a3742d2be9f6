//! rollcall-web: HTTP surface over the capture pipelines.
//!
//! Exposes the router, state and error mapping so the `rollcalld` binary and
//! the integration tests build the same application.

pub mod error;
pub mod handlers;
pub mod pages;
pub mod router;
pub mod state;

pub use router::build_app_router;
pub use state::{AppState, CameraPipelines, Pipelines};
