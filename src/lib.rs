pub mod config;
pub mod error;
pub mod lookup;
pub mod models;
pub mod relay;
pub mod server;
pub mod session;
pub mod telemetry;

pub use error::{DirectError, Result};
