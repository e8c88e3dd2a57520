//! Core business logic for opinionated.

pub mod services;

pub use services::*;
