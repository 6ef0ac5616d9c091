//! Configuration parsing for the TouchFree client
//!
//! This crate handles parsing KDL configuration files into the settings
//! consumed by `touchfree-client`, and rendering a default configuration
//! document for `touchfree init`.

mod error;
mod generator;
mod model;
mod parser;

pub use error::ConfigError;
pub use generator::generate_default_config;
pub use model::*;
pub use parser::{load_config, parse_config, parse_config_str};
