pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod fmt;
pub mod hasher;
pub mod progress;
pub mod scanner;
pub mod summary;
pub mod sync;

pub use config::AppConfig;
pub use engine::Library;
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
