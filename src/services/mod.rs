//! HTTP services over the rover.
//!
//! - `shared`: the rover behind a lock ([`SharedRover`]) and the
//!   [`RoverProvider`] trait the handlers are written against
//! - `http_handler`: endpoint logic and static pages, shared by the device
//!   servers and the simulator
//! - `web` (`web` feature): axum router for the desktop simulator
//!
//! # Shared State Pattern
//!
//! One rover, one lock, any number of server threads:
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_rover::services::{HttpApiHandler, SharedRover};
//!
//! let rover = Arc::new(SharedRover::new(rover));
//! let api = Arc::new(HttpApiHandler::new(Arc::clone(&rover)));
//! ```

pub mod http_handler;
pub mod shared;

#[cfg(feature = "web")]
pub mod web;

pub use http_handler::*;
pub use shared::*;

#[cfg(feature = "web")]
pub use web::*;
