pub mod config;
pub mod error;
pub mod paths;

pub use config::{Config, ErrorStatusPolicy};
pub use error::{GateError, Result};
