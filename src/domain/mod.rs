//! Pure domain layer: models, events, errors and ports.

pub mod errors;
pub mod models;
pub mod ports;
