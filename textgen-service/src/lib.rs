//! textgen-service: HTTP front-end for a pre-trained text-generation model.
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod services;
pub mod startup;

pub use startup::{build_router, AppState, Application};
