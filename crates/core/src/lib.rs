pub mod config;
pub mod error;
pub mod types;

pub use config::load_manifest;
pub use error::{ConfigError, Error, PublishError, RenderError, Result};
pub use types::*;
