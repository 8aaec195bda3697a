// cargo watch -x 'fmt' -x 'test'

pub mod azure;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod processing;

pub use config::LifecycleConfig;
pub use error::{LifecycleError, Result};
pub use processing::{Lifecycle, LifecycleReport};
