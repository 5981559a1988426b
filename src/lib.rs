// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod error;
pub mod logging;
pub mod ui;
pub mod utils;

// MVC Architecture
pub mod controller;
pub mod model;
pub mod view;

pub use config::EngineConfig;
pub use error::{Error, Result};
